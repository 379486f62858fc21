//! Contributor role and music group role endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use musiclib_common::db::roles;
use musiclib_common::db::{ContributorRole, MusicGroupRole};
use musiclib_common::forms::{ContributorRoleForm, MusicGroupRoleForm};

use crate::error::ApiResult;
use crate::pagination::{ListParams, ListQuery, ListResponse};
use crate::AppState;

/// GET /api/contributor-roles
pub async fn list_contributor_roles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse<ContributorRole>>> {
    let params = ListParams::from(query);
    let total = roles::count_contributor_roles(&state.db, &params.filter).await?;
    let pagination = params.paginate(total);
    let items = roles::list_contributor_roles(&state.db, &params.filter, pagination.window()).await?;
    Ok(Json(ListResponse::new(items, total, pagination, &params)))
}

/// POST /api/contributor-roles
pub async fn create_contributor_role(
    State(state): State<AppState>,
    Json(form): Json<ContributorRoleForm>,
) -> ApiResult<(StatusCode, Json<ContributorRole>)> {
    let role = roles::create_contributor_role(&state.db, &form).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

/// GET /api/contributor-roles/:id
pub async fn get_contributor_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ContributorRole>> {
    Ok(Json(roles::get_contributor_role(&state.db, id).await?))
}

/// PUT /api/contributor-roles/:id
pub async fn update_contributor_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<ContributorRoleForm>,
) -> ApiResult<Json<ContributorRole>> {
    Ok(Json(roles::update_contributor_role(&state.db, id, &form).await?))
}

/// DELETE /api/contributor-roles/:id
///
/// 409 while performances still credit the role.
pub async fn delete_contributor_role(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    roles::delete_contributor_role(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/music-group-roles
pub async fn list_music_group_roles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse<MusicGroupRole>>> {
    let params = ListParams::from(query);
    let total = roles::count_music_group_roles(&state.db, &params.filter).await?;
    let pagination = params.paginate(total);
    let items = roles::list_music_group_roles(&state.db, &params.filter, pagination.window()).await?;
    Ok(Json(ListResponse::new(items, total, pagination, &params)))
}

/// POST /api/music-group-roles
pub async fn create_music_group_role(
    State(state): State<AppState>,
    Json(form): Json<MusicGroupRoleForm>,
) -> ApiResult<(StatusCode, Json<MusicGroupRole>)> {
    let role = roles::create_music_group_role(&state.db, &form).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

/// GET /api/music-group-roles/:id
pub async fn get_music_group_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MusicGroupRole>> {
    Ok(Json(roles::get_music_group_role(&state.db, id).await?))
}

/// PUT /api/music-group-roles/:id
pub async fn update_music_group_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<MusicGroupRoleForm>,
) -> ApiResult<Json<MusicGroupRole>> {
    Ok(Json(roles::update_music_group_role(&state.db, id, &form).await?))
}

/// DELETE /api/music-group-roles/:id
pub async fn delete_music_group_role(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    roles::delete_music_group_role(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build role routes
pub fn role_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/contributor-roles",
            get(list_contributor_roles).post(create_contributor_role),
        )
        .route(
            "/api/contributor-roles/:id",
            get(get_contributor_role)
                .put(update_contributor_role)
                .delete(delete_contributor_role),
        )
        .route(
            "/api/music-group-roles",
            get(list_music_group_roles).post(create_music_group_role),
        )
        .route(
            "/api/music-group-roles/:id",
            get(get_music_group_role)
                .put(update_music_group_role)
                .delete(delete_music_group_role),
        )
}
