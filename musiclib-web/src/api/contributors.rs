//! Contributor endpoints, including previous names

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use musiclib_common::db::contributors::{self, ContributorDetail};
use musiclib_common::db::{Contributor, ContributorPreviousName};
use musiclib_common::forms::{ContributorForm, PreviousNameForm};
use serde::Serialize;

use crate::error::ApiResult;
use crate::pagination::{ListParams, ListQuery, ListResponse};
use crate::AppState;

/// List row: stored fields plus the name the catalog shows
#[derive(Debug, Serialize)]
pub struct ContributorListItem {
    #[serde(flatten)]
    pub contributor: Contributor,
    pub display_name: String,
}

impl From<Contributor> for ContributorListItem {
    fn from(contributor: Contributor) -> Self {
        let display_name = contributor.display_name();
        Self {
            contributor,
            display_name,
        }
    }
}

/// Date checks ("cannot be in the future") run against the server's local day
fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// GET /api/contributors
pub async fn list_contributors(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse<ContributorListItem>>> {
    let params = ListParams::from(query);
    let total = contributors::count(&state.db, &params.filter).await?;
    let pagination = params.paginate(total);
    let items = contributors::list(&state.db, &params.filter, pagination.window())
        .await?
        .into_iter()
        .map(ContributorListItem::from)
        .collect();
    Ok(Json(ListResponse::new(items, total, pagination, &params)))
}

/// POST /api/contributors
pub async fn create_contributor(
    State(state): State<AppState>,
    Json(form): Json<ContributorForm>,
) -> ApiResult<(StatusCode, Json<Contributor>)> {
    let contributor = contributors::create(&state.db, &form, today()).await?;
    Ok((StatusCode::CREATED, Json(contributor)))
}

/// GET /api/contributors/:id
pub async fn get_contributor(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<ContributorDetail>> {
    Ok(Json(contributors::detail(&state.db, id).await?))
}

/// PUT /api/contributors/:id
pub async fn update_contributor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<ContributorForm>,
) -> ApiResult<Json<Contributor>> {
    Ok(Json(contributors::update(&state.db, id, &form, today()).await?))
}

/// DELETE /api/contributors/:id
pub async fn delete_contributor(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    contributors::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/contributors/:id/previous-names
pub async fn list_previous_names(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<ContributorPreviousName>>> {
    contributors::get(&state.db, id).await?;
    Ok(Json(contributors::list_previous_names(&state.db, id).await?))
}

/// POST /api/contributors/:id/previous-names
pub async fn add_previous_name(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<PreviousNameForm>,
) -> ApiResult<(StatusCode, Json<ContributorPreviousName>)> {
    let name = contributors::add_previous_name(&state.db, id, &form).await?;
    Ok((StatusCode::CREATED, Json(name)))
}

/// DELETE /api/previous-names/:id
pub async fn delete_previous_name(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    contributors::delete_previous_name(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build contributor routes
pub fn contributor_routes() -> Router<AppState> {
    Router::new()
        .route("/api/contributors", get(list_contributors).post(create_contributor))
        .route(
            "/api/contributors/:id",
            get(get_contributor).put(update_contributor).delete(delete_contributor),
        )
        .route(
            "/api/contributors/:id/previous-names",
            get(list_previous_names).post(add_previous_name),
        )
        .route("/api/previous-names/:id", delete(delete_previous_name))
}
