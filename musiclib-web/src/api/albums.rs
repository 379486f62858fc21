//! Album endpoints: CRUD, tracks, track order and cover image

use std::collections::HashMap;
use std::path::{Component, Path as FsPath, PathBuf};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Form, Json, Router,
};
use musiclib_common::config::COVERS_DIR;
use musiclib_common::db::albums::{self, AlbumDetail};
use musiclib_common::db::{Album, AlbumTrack};
use musiclib_common::forms::{AlbumForm, AlbumTrackForm};
use musiclib_common::track_order::parse_order_fields;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::pagination::{ListParams, ListQuery, ListResponse};
use crate::AppState;

/// Largest accepted cover upload
pub const MAX_COVER_BYTES: usize = 10 * 1024 * 1024;

/// GET /api/albums
pub async fn list_albums(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse<Album>>> {
    let params = ListParams::from(query);
    let total = albums::count(&state.db, &params.filter).await?;
    let pagination = params.paginate(total);
    let items = albums::list(&state.db, &params.filter, pagination.window()).await?;
    Ok(Json(ListResponse::new(items, total, pagination, &params)))
}

/// POST /api/albums
pub async fn create_album(
    State(state): State<AppState>,
    Json(form): Json<AlbumForm>,
) -> ApiResult<(StatusCode, Json<Album>)> {
    let album = albums::create(&state.db, &form).await?;
    Ok((StatusCode::CREATED, Json(album)))
}

/// GET /api/albums/:id
pub async fn get_album(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<AlbumDetail>> {
    Ok(Json(albums::detail(&state.db, id).await?))
}

/// PUT /api/albums/:id
pub async fn update_album(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<AlbumForm>,
) -> ApiResult<Json<Album>> {
    Ok(Json(albums::update(&state.db, id, &form).await?))
}

/// DELETE /api/albums/:id
///
/// The cover file is removed along with the row.
pub async fn delete_album(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    let album = albums::delete(&state.db, id).await?;
    if let Some(cover) = album.cover_image {
        remove_media_file(&state.media_root, &cover).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/albums/:id/tracks
pub async fn list_tracks(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Vec<AlbumTrack>>> {
    albums::get(&state.db, id).await?;
    Ok(Json(albums::tracks(&state.db, id).await?))
}

/// POST /api/albums/:id/tracks
pub async fn add_track(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<AlbumTrackForm>,
) -> ApiResult<(StatusCode, Json<AlbumTrack>)> {
    let track = albums::add_track(&state.db, id, &form).await?;
    Ok((StatusCode::CREATED, Json(track)))
}

/// DELETE /api/albums/:id/tracks/:album_song_id
pub async fn remove_track(
    State(state): State<AppState>,
    Path((id, album_song_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    albums::remove_track(&state.db, id, album_song_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/albums/:id/order
///
/// Form body of `order_<album_song_id>=<n>` fields. On rejection the reply is
/// 422 with every distinct problem and the album as it still is.
pub async fn update_track_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(fields): Form<HashMap<String, String>>,
) -> ApiResult<Response> {
    let submitted = parse_order_fields(&fields);

    match albums::update_track_order(&state.db, id, &submitted).await {
        Ok(_) => Ok(Json(albums::detail(&state.db, id).await?).into_response()),
        Err(musiclib_common::Error::Validation(errors)) => {
            let album = albums::detail(&state.db, id).await?;
            let body = json!({
                "errors": errors.form_messages(),
                "album": album,
            });
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// File extension for an accepted cover content type
pub fn cover_extension(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    match mime.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// PUT /api/albums/:id/cover
///
/// Raw image body. Stored as `album_covers/<uuid>.<ext>` under the media
/// folder; a previous cover file is deleted once the row points at the new one.
pub async fn upload_cover(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Album>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let extension = cover_extension(content_type)
        .ok_or_else(|| ApiError::UnsupportedMediaType(format!("Cover must be JPEG, PNG, GIF or WebP, got '{}'", content_type)))?;
    if body.is_empty() {
        return Err(ApiError::BadRequest("Cover image is empty".to_string()));
    }

    albums::get(&state.db, id).await?;

    let relative = format!("{}/{}.{}", COVERS_DIR, Uuid::new_v4(), extension);
    let target = state.media_root.join(&relative);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&target, &body).await?;

    let previous = match albums::set_cover_image(&state.db, id, Some(relative.as_str())).await {
        Ok(previous) => previous,
        Err(e) => {
            remove_media_file(&state.media_root, &relative).await;
            return Err(e.into());
        }
    };
    info!("Stored cover for album {} ({} bytes) at {}", id, body.len(), relative);

    if let Some(old) = previous.filter(|old| *old != relative) {
        remove_media_file(&state.media_root, &old).await;
    }

    Ok(Json(albums::get(&state.db, id).await?))
}

/// Media-relative path resolved inside the media folder, if it stays there
fn media_file(media_root: &FsPath, relative: &str) -> Option<PathBuf> {
    let relative = FsPath::new(relative);
    let contained = relative.components().all(|c| matches!(c, Component::Normal(_)));
    contained.then(|| media_root.join(relative))
}

async fn remove_media_file(media_root: &FsPath, relative: &str) {
    let Some(path) = media_file(media_root, relative) else {
        warn!("Refusing to delete media path outside the media folder: {}", relative);
        return;
    };
    match tokio::fs::remove_file(&path).await {
        Ok(()) => info!("Deleted media file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not delete media file {}: {}", path.display(), e),
    }
}

/// Build album routes
pub fn album_routes() -> Router<AppState> {
    Router::new()
        .route("/api/albums", get(list_albums).post(create_album))
        .route("/api/albums/:id", get(get_album).put(update_album).delete(delete_album))
        .route("/api/albums/:id/tracks", get(list_tracks).post(add_track))
        .route("/api/albums/:id/tracks/:album_song_id", delete(remove_track))
        .route("/api/albums/:id/order", post(update_track_order))
        .route(
            "/api/albums/:id/cover",
            put(upload_cover).layer(DefaultBodyLimit::max(MAX_COVER_BYTES)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_extension() {
        assert_eq!(cover_extension("image/jpeg"), Some("jpg"));
        assert_eq!(cover_extension("image/PNG"), Some("png"));
        assert_eq!(cover_extension("image/webp; charset=binary"), Some("webp"));
        assert_eq!(cover_extension("text/plain"), None);
        assert_eq!(cover_extension(""), None);
    }

    #[test]
    fn test_media_file_stays_inside_root() {
        let root = FsPath::new("/data/media");
        assert_eq!(
            media_file(root, "album_covers/a.jpg"),
            Some(PathBuf::from("/data/media/album_covers/a.jpg"))
        );
        assert_eq!(media_file(root, "../musiclib.db"), None);
        assert_eq!(media_file(root, "/etc/passwd"), None);
    }
}
