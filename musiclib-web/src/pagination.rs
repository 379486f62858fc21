//! List query parsing and pagination
//!
//! Every list endpoint accepts `letter`, `order`, `paginate_by` and `page`.
//! Bad values never fail a request; they fall back to defaults.

use musiclib_common::db::{ListFilter, PageWindow, SortOrder};
use serde::{Deserialize, Serialize};

/// Page size when none (or garbage) is requested
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page size a client may ask for
pub const MAX_PAGE_SIZE: i64 = 100;

/// Page sizes offered to clients
pub const PAGINATE_OPTIONS: [i64; 4] = [10, 20, 50, 100];

/// Raw list query string; everything stays text until [`ListParams`] parses it
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub letter: Option<String>,
    pub order: Option<String>,
    pub paginate_by: Option<String>,
    pub page: Option<String>,
}

/// Parsed list options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub filter: ListFilter,
    pub page_size: i64,
    pub requested_page: i64,
}

impl From<ListQuery> for ListParams {
    fn from(query: ListQuery) -> Self {
        let page_size = query
            .paginate_by
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|&n| n >= 1)
            .map(|n| n.min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let requested_page = query
            .page
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(1);

        Self {
            filter: ListFilter::new(query.letter.as_deref(), SortOrder::parse_lenient(query.order.as_deref())),
            page_size,
            requested_page,
        }
    }
}

impl ListParams {
    pub fn paginate(&self, total_results: i64) -> Pagination {
        calculate_pagination(total_results, self.requested_page, self.page_size)
    }
}

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Total number of pages; an empty list still has one
    pub total_pages: i64,
    pub page_size: i64,
    /// Offset for SQL LIMIT/OFFSET query
    pub offset: i64,
}

impl Pagination {
    pub fn window(&self) -> PageWindow {
        PageWindow {
            limit: self.page_size,
            offset: self.offset,
        }
    }
}

/// Calculate pagination metadata, clamping the page into [1, total_pages]
///
/// # Examples
/// ```
/// use musiclib_web::pagination::calculate_pagination;
///
/// // 25 results at 10 per page = 3 pages
/// let p = calculate_pagination(25, 2, 10);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 10);
///
/// // Out-of-bounds page gets clamped
/// let p = calculate_pagination(25, 99, 10);
/// assert_eq!(p.page, 3);
/// ```
pub fn calculate_pagination(total_results: i64, requested_page: i64, page_size: i64) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = ((total_results + page_size - 1) / page_size).max(1);
    let page = requested_page.clamp(1, total_pages);

    Pagination {
        page,
        total_pages,
        page_size,
        offset: (page - 1) * page_size,
    }
}

/// One page of a list plus everything a client needs to render its controls
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
    pub paginate_by: i64,
    pub letter: Option<String>,
    pub order: SortOrder,
    pub paginate_options: [i64; 4],
    pub alphabet: Vec<char>,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            total_pages: pagination.total_pages,
            paginate_by: pagination.page_size,
            letter: params.filter.letter.clone(),
            order: params.filter.order,
            paginate_options: PAGINATE_OPTIONS,
            alphabet: ('A'..='Z').collect(),
        }
    }
}
