//! Song performance (credit) endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use musiclib_common::db::performances;
use musiclib_common::db::SongPerformance;
use musiclib_common::forms::PerformanceForm;

use crate::error::ApiResult;
use crate::AppState;

/// POST /api/performances
///
/// Exactly one of contributor+role or music group+role; anything else is 422.
pub async fn create_performance(
    State(state): State<AppState>,
    Json(form): Json<PerformanceForm>,
) -> ApiResult<(StatusCode, Json<SongPerformance>)> {
    let performance = performances::create(&state.db, &form).await?;
    Ok((StatusCode::CREATED, Json(performance)))
}

/// GET /api/performances/:id
pub async fn get_performance(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<SongPerformance>> {
    Ok(Json(performances::get(&state.db, id).await?))
}

/// PUT /api/performances/:id
pub async fn update_performance(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<PerformanceForm>,
) -> ApiResult<Json<SongPerformance>> {
    Ok(Json(performances::update(&state.db, id, &form).await?))
}

/// DELETE /api/performances/:id
pub async fn delete_performance(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    performances::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build performance routes
pub fn performance_routes() -> Router<AppState> {
    Router::new()
        .route("/api/performances", post(create_performance))
        .route(
            "/api/performances/:id",
            get(get_performance).put(update_performance).delete(delete_performance),
        )
}
