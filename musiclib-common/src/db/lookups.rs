//! Genre, country and language tables
//!
//! The three tables share one shape (`id`, `name`) and one rule: names are
//! unique regardless of letter case, so "pop" is rejected when "Pop" exists.

use sqlx::SqlitePool;
use tracing::{info, warn};

use super::listing::{self, ListFilter, ListSource, PageWindow};
use super::models::Lookup;
use crate::forms::LookupForm;
use crate::validation::{same_name, ValidationErrors};
use crate::{Error, Result};

/// Which lookup table an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Genre,
    Country,
    Language,
}

impl LookupKind {
    pub fn table(&self) -> &'static str {
        match self {
            LookupKind::Genre => "genres",
            LookupKind::Country => "countries",
            LookupKind::Language => "languages",
        }
    }

    /// Lower-case singular noun used in messages
    pub fn noun(&self) -> &'static str {
        match self {
            LookupKind::Genre => "genre",
            LookupKind::Country => "country",
            LookupKind::Language => "language",
        }
    }

    fn source(&self) -> ListSource {
        match self {
            LookupKind::Genre => ListSource {
                select: "SELECT id, name FROM genres",
                from: "FROM genres",
                sort_expr: "name",
                id_column: "id",
            },
            LookupKind::Country => ListSource {
                select: "SELECT id, name FROM countries",
                from: "FROM countries",
                sort_expr: "name",
                id_column: "id",
            },
            LookupKind::Language => ListSource {
                select: "SELECT id, name FROM languages",
                from: "FROM languages",
                sort_expr: "name",
                id_column: "id",
            },
        }
    }
}

pub async fn count(pool: &SqlitePool, kind: LookupKind, filter: &ListFilter) -> Result<i64> {
    listing::count(pool, &kind.source(), filter).await
}

pub async fn list(
    pool: &SqlitePool,
    kind: LookupKind,
    filter: &ListFilter,
    window: PageWindow,
) -> Result<Vec<Lookup>> {
    listing::fetch_page(pool, &kind.source(), filter, window).await
}

pub async fn get(pool: &SqlitePool, kind: LookupKind, id: i64) -> Result<Lookup> {
    sqlx::query_as::<_, Lookup>(&format!("SELECT id, name FROM {} WHERE id = ?", kind.table()))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("{} {}", kind.noun(), id)))
}

/// Reject `name` when another row already has it in any letter case
async fn ensure_unique(pool: &SqlitePool, kind: LookupKind, name: &str, exclude_id: Option<i64>) -> Result<()> {
    let existing: Vec<Lookup> = sqlx::query_as(&format!("SELECT id, name FROM {}", kind.table()))
        .fetch_all(pool)
        .await?;

    let clash = existing
        .iter()
        .any(|row| Some(row.id) != exclude_id && same_name(&row.name, name));

    if clash {
        warn!("Rejected duplicate {} name '{}'", kind.noun(), name);
        let mut errors = ValidationErrors::new();
        errors.add("name", format!("This {} already exists.", kind.noun()));
        return Err(errors.into());
    }
    Ok(())
}

pub async fn create(pool: &SqlitePool, kind: LookupKind, form: &LookupForm) -> Result<Lookup> {
    let name = form.clean()?;
    ensure_unique(pool, kind, &name, None).await?;

    let id = sqlx::query(&format!("INSERT INTO {} (name) VALUES (?)", kind.table()))
        .bind(&name)
        .execute(pool)
        .await?
        .last_insert_rowid();

    info!("Created {} {} '{}'", kind.noun(), id, name);
    Ok(Lookup { id, name })
}

pub async fn update(pool: &SqlitePool, kind: LookupKind, id: i64, form: &LookupForm) -> Result<Lookup> {
    get(pool, kind, id).await?;
    let name = form.clean()?;
    ensure_unique(pool, kind, &name, Some(id)).await?;

    sqlx::query(&format!("UPDATE {} SET name = ? WHERE id = ?", kind.table()))
        .bind(&name)
        .bind(id)
        .execute(pool)
        .await?;

    info!("Renamed {} {} to '{}'", kind.noun(), id, name);
    Ok(Lookup { id, name })
}

pub async fn delete(pool: &SqlitePool, kind: LookupKind, id: i64) -> Result<()> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", kind.table()))
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("{} {}", kind.noun(), id)));
    }
    info!("Deleted {} {}", kind.noun(), id);
    Ok(())
}

/// Distinct genres of the songs on an album, by name
pub(crate) async fn genres_for_album(pool: &SqlitePool, album_id: i64) -> Result<Vec<Lookup>> {
    let rows = sqlx::query_as::<_, Lookup>(
        r#"
        SELECT DISTINCT g.id, g.name
        FROM genres g
        JOIN song_genres sg ON sg.genre_id = g.id
        JOIN album_songs a ON a.song_id = sg.song_id
        WHERE a.album_id = ?
        ORDER BY g.name COLLATE NOCASE
        "#,
    )
    .bind(album_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Distinct languages of the songs on an album, by name
pub(crate) async fn languages_for_album(pool: &SqlitePool, album_id: i64) -> Result<Vec<Lookup>> {
    let rows = sqlx::query_as::<_, Lookup>(
        r#"
        SELECT DISTINCT l.id, l.name
        FROM languages l
        JOIN songs s ON s.language_id = l.id
        JOIN album_songs a ON a.song_id = s.id
        WHERE a.album_id = ?
        ORDER BY l.name COLLATE NOCASE
        "#,
    )
    .bind(album_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;
    use crate::db::listing::SortOrder;

    fn form(name: &str) -> LookupForm {
        LookupForm {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_name() {
        let pool = init_memory_database().await.unwrap();
        let genre = create(&pool, LookupKind::Genre, &form("  jazz ")).await.unwrap();
        assert_eq!(genre.name, "Jazz");
        assert_eq!(get(&pool, LookupKind::Genre, genre.id).await.unwrap(), genre);
    }

    #[tokio::test]
    async fn test_duplicate_in_other_case_rejected() {
        let pool = init_memory_database().await.unwrap();
        create(&pool, LookupKind::Genre, &form("Pop")).await.unwrap();

        match create(&pool, LookupKind::Genre, &form("pop")).await {
            Err(Error::Validation(errors)) => {
                assert_eq!(errors.field("name"), ["This genre already exists.".to_string()]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_message_per_kind() {
        let pool = init_memory_database().await.unwrap();
        create(&pool, LookupKind::Country, &form("Italy")).await.unwrap();
        create(&pool, LookupKind::Language, &form("Czech")).await.unwrap();

        let err = create(&pool, LookupKind::Country, &form("italy")).await.unwrap_err();
        assert!(err.to_string().contains("This country already exists."));
        let err = create(&pool, LookupKind::Language, &form("CZECH")).await.unwrap_err();
        assert!(err.to_string().contains("This language already exists."));
    }

    #[tokio::test]
    async fn test_same_name_allowed_across_tables() {
        let pool = init_memory_database().await.unwrap();
        create(&pool, LookupKind::Country, &form("Czech")).await.unwrap();
        create(&pool, LookupKind::Language, &form("Czech")).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_keeps_own_name() {
        let pool = init_memory_database().await.unwrap();
        let genre = create(&pool, LookupKind::Genre, &form("Rock")).await.unwrap();
        let renamed = update(&pool, LookupKind::Genre, genre.id, &form("rock")).await.unwrap();
        assert_eq!(renamed.name, "Rock");
    }

    #[tokio::test]
    async fn test_list_letter_and_order() {
        let pool = init_memory_database().await.unwrap();
        for name in ["Blues", "Bossa nova", "Jazz", "Ambient"] {
            create(&pool, LookupKind::Genre, &form(name)).await.unwrap();
        }

        let filter = ListFilter::new(Some("b"), SortOrder::Desc);
        assert_eq!(count(&pool, LookupKind::Genre, &filter).await.unwrap(), 2);
        let names: Vec<_> = list(&pool, LookupKind::Genre, &filter, PageWindow::ALL)
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["Bossa nova", "Blues"]);
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let pool = init_memory_database().await.unwrap();
        assert!(matches!(
            delete(&pool, LookupKind::Language, 42).await,
            Err(Error::NotFound(_))
        ));
    }
}
