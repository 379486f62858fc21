//! Genre, country and language endpoints
//!
//! The three tables share one set of handlers; the route decides the kind.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use musiclib_common::db::lookups::{self, LookupKind};
use musiclib_common::db::Lookup;
use musiclib_common::forms::LookupForm;

use crate::error::ApiResult;
use crate::pagination::{ListParams, ListQuery, ListResponse};
use crate::AppState;

async fn list(state: AppState, kind: LookupKind, query: ListQuery) -> ApiResult<Json<ListResponse<Lookup>>> {
    let params = ListParams::from(query);
    let total = lookups::count(&state.db, kind, &params.filter).await?;
    let pagination = params.paginate(total);
    let items = lookups::list(&state.db, kind, &params.filter, pagination.window()).await?;
    Ok(Json(ListResponse::new(items, total, pagination, &params)))
}

async fn create(state: AppState, kind: LookupKind, form: LookupForm) -> ApiResult<(StatusCode, Json<Lookup>)> {
    let lookup = lookups::create(&state.db, kind, &form).await?;
    Ok((StatusCode::CREATED, Json(lookup)))
}

async fn show(state: AppState, kind: LookupKind, id: i64) -> ApiResult<Json<Lookup>> {
    Ok(Json(lookups::get(&state.db, kind, id).await?))
}

async fn update(state: AppState, kind: LookupKind, id: i64, form: LookupForm) -> ApiResult<Json<Lookup>> {
    Ok(Json(lookups::update(&state.db, kind, id, &form).await?))
}

async fn remove(state: AppState, kind: LookupKind, id: i64) -> ApiResult<StatusCode> {
    lookups::delete(&state.db, kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET/POST <base>` and `GET/PUT/DELETE <base>/:id` for one lookup kind
fn kind_routes(base: &str, kind: LookupKind) -> Router<AppState> {
    Router::new()
        .route(
            base,
            get(move |State(state): State<AppState>, Query(query): Query<ListQuery>| list(state, kind, query)).post(
                move |State(state): State<AppState>, Json(form): Json<LookupForm>| create(state, kind, form),
            ),
        )
        .route(
            &format!("{}/:id", base),
            get(move |State(state): State<AppState>, Path(id): Path<i64>| show(state, kind, id))
                .put(
                    move |State(state): State<AppState>, Path(id): Path<i64>, Json(form): Json<LookupForm>| {
                        update(state, kind, id, form)
                    },
                )
                .delete(move |State(state): State<AppState>, Path(id): Path<i64>| remove(state, kind, id)),
        )
}

/// Build lookup routes
pub fn lookup_routes() -> Router<AppState> {
    Router::new()
        .merge(kind_routes("/api/genres", LookupKind::Genre))
        .merge(kind_routes("/api/countries", LookupKind::Country))
        .merge(kind_routes("/api/languages", LookupKind::Language))
}
