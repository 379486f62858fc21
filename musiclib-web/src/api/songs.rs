//! Song endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use musiclib_common::db::songs::{self, SongDetail};
use musiclib_common::db::Song;
use musiclib_common::forms::SongForm;

use crate::error::ApiResult;
use crate::pagination::{ListParams, ListQuery, ListResponse};
use crate::AppState;

/// GET /api/songs
pub async fn list_songs(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse<Song>>> {
    let params = ListParams::from(query);
    let total = songs::count(&state.db, &params.filter).await?;
    let pagination = params.paginate(total);
    let items = songs::list(&state.db, &params.filter, pagination.window()).await?;
    Ok(Json(ListResponse::new(items, total, pagination, &params)))
}

/// POST /api/songs
pub async fn create_song(
    State(state): State<AppState>,
    Json(form): Json<SongForm>,
) -> ApiResult<(StatusCode, Json<Song>)> {
    let song = songs::create(&state.db, &form).await?;
    Ok((StatusCode::CREATED, Json(song)))
}

/// GET /api/songs/:id
pub async fn get_song(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<SongDetail>> {
    Ok(Json(songs::detail(&state.db, id).await?))
}

/// PUT /api/songs/:id
pub async fn update_song(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<SongForm>,
) -> ApiResult<Json<Song>> {
    Ok(Json(songs::update(&state.db, id, &form).await?))
}

/// DELETE /api/songs/:id
///
/// Performances and album tracks of the song go with it.
pub async fn delete_song(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    songs::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build song routes
pub fn song_routes() -> Router<AppState> {
    Router::new()
        .route("/api/songs", get(list_songs).post(create_song))
        .route("/api/songs/:id", get(get_song).put(update_song).delete(delete_song))
}
