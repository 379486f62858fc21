//! musiclib-web library - HTTP service for the music catalog
//!
//! JSON CRUD for every catalog entity, album track ordering, cover upload,
//! search and the suggestion fragment used by the search box.

use std::path::PathBuf;

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod pagination;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Folder served under `/media`; covers live in its `album_covers/`
    pub media_root: PathBuf,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, media_root: PathBuf) -> Self {
        Self {
            db,
            media_root,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let media = ServeDir::new(&state.media_root);

    Router::new()
        .merge(api::health_routes())
        .merge(api::lookup_routes())
        .merge(api::role_routes())
        .merge(api::contributor_routes())
        .merge(api::music_group_routes())
        .merge(api::membership_routes())
        .merge(api::song_routes())
        .merge(api::performance_routes())
        .merge(api::album_routes())
        .merge(api::search_routes())
        .nest_service("/media", media)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
