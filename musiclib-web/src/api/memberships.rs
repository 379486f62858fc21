//! Music group membership endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use musiclib_common::db::memberships;
use musiclib_common::db::Membership;
use musiclib_common::forms::MembershipForm;

use crate::error::ApiResult;
use crate::AppState;

/// POST /api/memberships
pub async fn create_membership(
    State(state): State<AppState>,
    Json(form): Json<MembershipForm>,
) -> ApiResult<(StatusCode, Json<Membership>)> {
    let membership = memberships::create(&state.db, &form).await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

/// GET /api/memberships/:id
pub async fn get_membership(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Membership>> {
    Ok(Json(memberships::get(&state.db, id).await?))
}

/// PUT /api/memberships/:id
pub async fn update_membership(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<MembershipForm>,
) -> ApiResult<Json<Membership>> {
    Ok(Json(memberships::update(&state.db, id, &form).await?))
}

/// DELETE /api/memberships/:id
pub async fn delete_membership(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    memberships::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build membership routes
pub fn membership_routes() -> Router<AppState> {
    Router::new()
        .route("/api/memberships", post(create_membership))
        .route(
            "/api/memberships/:id",
            get(get_membership).put(update_membership).delete(delete_membership),
        )
}
