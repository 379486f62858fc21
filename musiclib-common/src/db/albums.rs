//! Albums, their credits and their ordered track lists

use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::{info, warn};

use super::listing::{self, ListFilter, ListSource, PageWindow};
use super::models::{Album, AlbumTrack, ContributorRef, Lookup, MusicGroupRef};
use super::music_groups::{self, GroupMembers};
use super::{check_reference, check_references, contributors, lookups, performances, replace_links};
use crate::categorize::{self, CategoryCredits, RoleGroups, RoleMerge};
use crate::format;
use crate::forms::{AlbumForm, AlbumTrackForm};
use crate::track_order;
use crate::validation::ValidationErrors;
use crate::{Error, Result};

const SOURCE: ListSource = ListSource {
    select: "SELECT id, title, released, summary, cover_image FROM albums",
    from: "FROM albums",
    sort_expr: "title",
    id_column: "id",
};

/// Everything shown on an album page
#[derive(Debug, Clone, Serialize)]
pub struct AlbumDetail {
    pub album: Album,
    /// "Artist A, Artist B / Group", or "Unknown"
    pub creator: String,
    pub artists: Vec<ContributorRef>,
    pub music_groups: Vec<MusicGroupRef>,
    pub tracks: Vec<AlbumTrack>,
    pub total_duration: Option<String>,
    pub genres: Vec<Lookup>,
    pub genre_label: String,
    pub languages: Vec<Lookup>,
    pub language_label: String,
    pub contributors_by_category: Vec<CategoryCredits>,
    pub groups_by_role: Vec<RoleGroups>,
    pub music_groups_with_members: Vec<GroupMembers>,
}

pub async fn count(pool: &SqlitePool, filter: &ListFilter) -> Result<i64> {
    listing::count(pool, &SOURCE, filter).await
}

pub async fn list(pool: &SqlitePool, filter: &ListFilter, window: PageWindow) -> Result<Vec<Album>> {
    listing::fetch_page(pool, &SOURCE, filter, window).await
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Album> {
    sqlx::query_as::<_, Album>("SELECT id, title, released, summary, cover_image FROM albums WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Album {}", id)))
}

async fn clean(pool: &SqlitePool, form: &AlbumForm) -> Result<AlbumForm> {
    let cleaned = form.clean()?;
    let mut errors = ValidationErrors::new();
    check_references(pool, &mut errors, "artist_ids", "contributors", &cleaned.artist_ids).await?;
    check_references(pool, &mut errors, "music_group_ids", "music_groups", &cleaned.music_group_ids).await?;
    errors.into_result()?;
    Ok(cleaned)
}

pub async fn create(pool: &SqlitePool, form: &AlbumForm) -> Result<Album> {
    let a = clean(pool, form).await?;

    let mut tx = pool.begin().await?;
    let id = sqlx::query("INSERT INTO albums (title, released, summary) VALUES (?, ?, ?)")
        .bind(&a.title)
        .bind(a.released)
        .bind(&a.summary)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();
    replace_links(&mut tx, "album_artists", "album_id", id, "contributor_id", &a.artist_ids).await?;
    replace_links(&mut tx, "album_music_groups", "album_id", id, "music_group_id", &a.music_group_ids).await?;
    tx.commit().await?;

    info!("Created album {} '{}'", id, a.title);
    get(pool, id).await
}

pub async fn update(pool: &SqlitePool, id: i64, form: &AlbumForm) -> Result<Album> {
    get(pool, id).await?;
    let a = clean(pool, form).await?;

    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE albums SET title = ?, released = ?, summary = ? WHERE id = ?")
        .bind(&a.title)
        .bind(a.released)
        .bind(&a.summary)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    replace_links(&mut tx, "album_artists", "album_id", id, "contributor_id", &a.artist_ids).await?;
    replace_links(&mut tx, "album_music_groups", "album_id", id, "music_group_id", &a.music_group_ids).await?;
    tx.commit().await?;

    info!("Updated album {}", id);
    get(pool, id).await
}

/// Delete an album and its track list; returns the removed row so the
/// caller can drop the cover file
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<Album> {
    let album = get(pool, id).await?;

    sqlx::query("DELETE FROM albums WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    info!("Deleted album {} '{}'", id, album.title);
    Ok(album)
}

/// Store a new cover path, returning the previous one
pub async fn set_cover_image(pool: &SqlitePool, id: i64, cover_image: Option<&str>) -> Result<Option<String>> {
    let album = get(pool, id).await?;

    sqlx::query("UPDATE albums SET cover_image = ? WHERE id = ?")
        .bind(cover_image)
        .bind(id)
        .execute(pool)
        .await?;

    info!("Album {} cover set to {:?}", id, cover_image);
    Ok(album.cover_image)
}

// ===== Tracks =====

/// Track list in play order; unordered tracks last
pub async fn tracks(pool: &SqlitePool, album_id: i64) -> Result<Vec<AlbumTrack>> {
    fetch_tracks(pool, album_id).await
}

async fn fetch_tracks<'e>(executor: impl SqliteExecutor<'e>, album_id: i64) -> Result<Vec<AlbumTrack>> {
    let tracks = sqlx::query_as::<_, AlbumTrack>(
        r#"
        SELECT a.id AS album_song_id, a.track_order, s.id AS song_id, s.title, s.duration
        FROM album_songs a
        JOIN songs s ON s.id = a.song_id
        WHERE a.album_id = ?
        ORDER BY a.track_order IS NULL, a.track_order, a.id
        "#,
    )
    .bind(album_id)
    .fetch_all(executor)
    .await?;
    Ok(tracks)
}

/// Append a song as track N+1
///
/// The position is computed by the INSERT itself so concurrent appends
/// never share a number.
pub async fn add_track(pool: &SqlitePool, album_id: i64, form: &AlbumTrackForm) -> Result<AlbumTrack> {
    get(pool, album_id).await?;
    let mut errors = ValidationErrors::new();
    check_reference(pool, &mut errors, "song_id", "songs", Some(form.song_id)).await?;
    errors.into_result()?;

    let id = sqlx::query(
        r#"
        INSERT INTO album_songs (album_id, song_id, track_order)
        SELECT ?, ?, COUNT(*) + 1 FROM album_songs WHERE album_id = ?
        "#,
    )
    .bind(album_id)
    .bind(form.song_id)
    .bind(album_id)
    .execute(pool)
    .await?
    .last_insert_rowid();

    let track = tracks(pool, album_id)
        .await?
        .into_iter()
        .find(|t| t.album_song_id == id)
        .ok_or_else(|| Error::Internal(format!("Track {} vanished after insert", id)))?;

    info!(
        "Added song {} to album {} as track {:?}",
        form.song_id, album_id, track.track_order
    );
    Ok(track)
}

/// Remove a track and close the gap it leaves in the numbering
pub async fn remove_track(pool: &SqlitePool, album_id: i64, album_song_id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    let removed: Option<Option<i64>> =
        sqlx::query_scalar("DELETE FROM album_songs WHERE id = ? AND album_id = ? RETURNING track_order")
            .bind(album_song_id)
            .bind(album_id)
            .fetch_optional(&mut *tx)
            .await?;
    let Some(removed_order) = removed else {
        return Err(Error::NotFound(format!("Track {} on album {}", album_song_id, album_id)));
    };

    if let Some(order) = removed_order {
        sqlx::query("UPDATE album_songs SET track_order = track_order - 1 WHERE album_id = ? AND track_order > ?")
            .bind(album_id)
            .bind(order)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    info!("Removed track {} from album {}", album_song_id, album_id);
    Ok(())
}

/// Apply a full reorder submission (album-song id → raw value)
///
/// Either every track gets its new position in one transaction, or nothing
/// changes and the distinct problems come back as form-level errors. The
/// track list is read and checked inside that same transaction.
pub async fn update_track_order(
    pool: &SqlitePool,
    album_id: i64,
    submitted: &BTreeMap<i64, String>,
) -> Result<Vec<AlbumTrack>> {
    let mut tx = pool.begin().await?;

    // No-op write: takes SQLite's write lock before the track list is read
    let touched = sqlx::query("UPDATE albums SET id = id WHERE id = ?")
        .bind(album_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if touched == 0 {
        return Err(Error::NotFound(format!("Album {}", album_id)));
    }

    let current = fetch_tracks(&mut *tx, album_id).await?;
    let assignments = match track_order::validate_track_order(&current, submitted) {
        Ok(assignments) => assignments,
        Err(messages) => {
            warn!("Rejected track order for album {}: {}", album_id, messages.join(" "));
            return Err(ValidationErrors::from_form_messages(messages).into());
        }
    };

    for &(album_song_id, order) in &assignments {
        sqlx::query("UPDATE album_songs SET track_order = ? WHERE id = ? AND album_id = ?")
            .bind(order)
            .bind(album_song_id)
            .bind(album_id)
            .execute(&mut *tx)
            .await?;
    }
    let reordered = fetch_tracks(&mut *tx, album_id).await?;
    tx.commit().await?;

    info!("Reordered {} tracks on album {}", assignments.len(), album_id);
    Ok(reordered)
}

// ===== Detail =====

pub async fn artists(pool: &SqlitePool, album_id: i64) -> Result<Vec<ContributorRef>> {
    contributors::refs_in(pool, "SELECT contributor_id FROM album_artists WHERE album_id = ?", album_id).await
}

pub async fn groups(pool: &SqlitePool, album_id: i64) -> Result<Vec<MusicGroupRef>> {
    music_groups::refs_in(
        pool,
        "SELECT music_group_id FROM album_music_groups WHERE album_id = ?",
        album_id,
    )
    .await
}

/// Sum of known track durations, `None` when no track has one
fn total_duration(tracks: &[AlbumTrack]) -> Option<String> {
    let durations: Vec<i64> = tracks.iter().filter_map(|t| t.duration).collect();
    if durations.is_empty() {
        None
    } else {
        Some(format::format_seconds(durations.iter().sum()))
    }
}

pub async fn detail(pool: &SqlitePool, id: i64) -> Result<AlbumDetail> {
    let album = get(pool, id).await?;

    let artists = artists(pool, id).await?;
    let groups = groups(pool, id).await?;
    let artist_names: Vec<String> = artists.iter().map(|a| a.name.clone()).collect();
    let group_names: Vec<String> = groups.iter().map(|g| g.name.clone()).collect();

    let tracks = tracks(pool, id).await?;
    let genres = lookups::genres_for_album(pool, id).await?;
    let languages = lookups::languages_for_album(pool, id).await?;

    let performances = performances::for_album(pool, id).await?;
    let involved = categorize::involved_music_groups(&performances);

    Ok(AlbumDetail {
        creator: format::display_creator(&artist_names, &group_names),
        artists,
        music_groups: groups,
        total_duration: total_duration(&tracks),
        tracks,
        genre_label: format::count_label("Genre", genres.len()),
        genres,
        language_label: format::count_label("Language", languages.len()),
        languages,
        contributors_by_category: categorize::contributors_by_category(&performances, RoleMerge::Sorted),
        groups_by_role: categorize::groups_by_role(&performances),
        music_groups_with_members: music_groups::with_members(pool, involved).await?,
        album,
    })
}
