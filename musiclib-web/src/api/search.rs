//! Catalog search and search-box suggestions

use std::fmt::Write as _;

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Json, Router,
};
use musiclib_common::db::search::{search_catalog, SearchResults};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::AppState;

/// Rows per entity type in a full search
pub const SEARCH_LIMIT: i64 = 20;

/// Rows per entity type in the suggestion fragment
pub const SUGGESTION_LIMIT: i64 = 5;

/// Shorter queries get no suggestions
pub const SUGGESTION_MIN_CHARS: usize = 2;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /api/search?q=
pub async fn search(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> ApiResult<Json<SearchResults>> {
    Ok(Json(search_catalog(&state.db, &query.q, SEARCH_LIMIT).await?))
}

/// GET /search/suggestions?q=
///
/// HTML fragment for the search box dropdown.
pub async fn suggestions(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> ApiResult<Html<String>> {
    let q = query.q.trim();
    if q.chars().count() < SUGGESTION_MIN_CHARS {
        return Ok(Html(String::new()));
    }

    let results = search_catalog(&state.db, q, SUGGESTION_LIMIT).await?;
    Ok(Html(render_suggestions(&results)))
}

/// Escape text for HTML element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// `<ul class="suggestions">` with one link per hit; empty results render nothing
pub fn render_suggestions(results: &SearchResults) -> String {
    if results.is_empty() {
        return String::new();
    }

    let mut items: Vec<(&str, String, &str)> = Vec::new();
    items.extend(results.songs.iter().map(|s| ("song", format!("/api/songs/{}", s.id), s.title.as_str())));
    items.extend(results.albums.iter().map(|a| ("album", format!("/api/albums/{}", a.id), a.title.as_str())));
    items.extend(
        results
            .contributors
            .iter()
            .map(|c| ("contributor", format!("/api/contributors/{}", c.id), c.name.as_str())),
    );
    items.extend(
        results
            .music_groups
            .iter()
            .map(|g| ("music-group", format!("/api/music-groups/{}", g.id), g.name.as_str())),
    );

    let mut html = String::from("<ul class=\"suggestions\">");
    for (kind, href, text) in items {
        // Writing into a String cannot fail
        let _ = write!(
            html,
            "<li class=\"suggestion suggestion-{}\"><a href=\"{}\">{}</a></li>",
            kind,
            href,
            escape_html(text)
        );
    }
    html.push_str("</ul>");
    html
}

/// Build search routes
pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/api/search", get(search))
        .route("/search/suggestions", get(suggestions))
}
