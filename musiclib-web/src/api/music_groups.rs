//! Music group endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use musiclib_common::db::music_groups::{self, MusicGroupDetail};
use musiclib_common::db::MusicGroup;
use musiclib_common::forms::MusicGroupForm;

use crate::error::ApiResult;
use crate::pagination::{ListParams, ListQuery, ListResponse};
use crate::AppState;

/// GET /api/music-groups
pub async fn list_music_groups(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse<MusicGroup>>> {
    let params = ListParams::from(query);
    let total = music_groups::count(&state.db, &params.filter).await?;
    let pagination = params.paginate(total);
    let items = music_groups::list(&state.db, &params.filter, pagination.window()).await?;
    Ok(Json(ListResponse::new(items, total, pagination, &params)))
}

/// POST /api/music-groups
pub async fn create_music_group(
    State(state): State<AppState>,
    Json(form): Json<MusicGroupForm>,
) -> ApiResult<(StatusCode, Json<MusicGroup>)> {
    let group = music_groups::create(&state.db, &form).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// GET /api/music-groups/:id
///
/// Members with their roles and active period, albums, songs and credits.
pub async fn get_music_group(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<MusicGroupDetail>> {
    Ok(Json(music_groups::detail(&state.db, id).await?))
}

/// PUT /api/music-groups/:id
pub async fn update_music_group(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<MusicGroupForm>,
) -> ApiResult<Json<MusicGroup>> {
    Ok(Json(music_groups::update(&state.db, id, &form).await?))
}

/// DELETE /api/music-groups/:id
pub async fn delete_music_group(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    music_groups::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build music group routes
pub fn music_group_routes() -> Router<AppState> {
    Router::new()
        .route("/api/music-groups", get(list_music_groups).post(create_music_group))
        .route(
            "/api/music-groups/:id",
            get(get_music_group).put(update_music_group).delete(delete_music_group),
        )
}
