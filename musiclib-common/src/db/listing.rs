//! Shared list queries: first-letter filter, sort direction, LIMIT/OFFSET window
//!
//! Each entity module describes its list with a [`ListSource`]; the count and
//! page queries are built here so every list behaves the same way.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::Result;

/// Sort direction of a list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than "desc" means ascending
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// User-facing list options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Case-insensitive prefix of the sort field
    pub letter: Option<String>,
    pub order: SortOrder,
}

impl ListFilter {
    pub fn new(letter: Option<&str>, order: SortOrder) -> Self {
        let letter = letter.map(str::trim).filter(|l| !l.is_empty()).map(str::to_string);
        Self { letter, order }
    }
}

/// SQL LIMIT/OFFSET pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: i64,
    pub offset: i64,
}

impl PageWindow {
    /// Everything, for callers that don't paginate
    pub const ALL: PageWindow = PageWindow { limit: -1, offset: 0 };
}

/// How one entity list is selected
pub(crate) struct ListSource {
    /// `SELECT ... FROM ...` without WHERE/ORDER
    pub select: &'static str,
    /// `FROM ...` used for the count query
    pub from: &'static str,
    /// Expression the list is ordered and letter-filtered by
    pub sort_expr: &'static str,
    /// Tiebreaker column for a stable order
    pub id_column: &'static str,
}

/// Escape `%`, `_` and `\` for a LIKE pattern using `ESCAPE '\'`
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_letter_filter(qb: &mut QueryBuilder<'_, Sqlite>, source: &ListSource, filter: &ListFilter) {
    if let Some(letter) = &filter.letter {
        qb.push(" WHERE ")
            .push(source.sort_expr)
            .push(" LIKE ")
            .push_bind(format!("{}%", escape_like(letter)))
            .push(" ESCAPE '\\'");
    }
}

/// Number of rows matching the filter
pub(crate) async fn count(pool: &SqlitePool, source: &ListSource, filter: &ListFilter) -> Result<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) ");
    qb.push(source.from);
    push_letter_filter(&mut qb, source, filter);

    let total: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    Ok(total)
}

/// One page of rows matching the filter, in the requested order
pub(crate) async fn fetch_page<T>(
    pool: &SqlitePool,
    source: &ListSource,
    filter: &ListFilter,
    window: PageWindow,
) -> Result<Vec<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let direction = filter.order.sql();
    let mut qb = QueryBuilder::<Sqlite>::new(source.select);
    push_letter_filter(&mut qb, source, filter);
    qb.push(format!(
        " ORDER BY {} COLLATE NOCASE {}, {} {}",
        source.sort_expr, direction, source.id_column, direction
    ));
    qb.push(" LIMIT ")
        .push_bind(window.limit)
        .push(" OFFSET ")
        .push_bind(window.offset);

    let rows = qb.build_query_as::<T>().fetch_all(pool).await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse_lenient(Some("desc")), SortOrder::Desc);
        assert_eq!(SortOrder::parse_lenient(Some("DESC")), SortOrder::Desc);
        assert_eq!(SortOrder::parse_lenient(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::parse_lenient(Some("sideways")), SortOrder::Asc);
        assert_eq!(SortOrder::parse_lenient(None), SortOrder::Asc);
    }

    #[test]
    fn test_blank_letter_ignored() {
        assert_eq!(ListFilter::new(Some("  "), SortOrder::Asc).letter, None);
        assert_eq!(ListFilter::new(Some("b"), SortOrder::Asc).letter.as_deref(), Some("b"));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("plain"), "plain");
    }
}
