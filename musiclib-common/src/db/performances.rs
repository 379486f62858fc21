//! Song performances: who is credited on a song, in which role
//!
//! A performance names either a contributor with a contributor role or a
//! music group with a music group role, never both. Validation rejects bad
//! combinations before the write and the `contributor_or_group` table
//! constraint backs it up.

use sqlx::SqlitePool;
use tracing::info;

use super::check_reference;
use super::models::{PerformanceRow, SongPerformance};
use crate::forms::PerformanceForm;
use crate::validation::{PerformerIds, ValidationErrors};
use crate::{Error, Result};

const SELECT: &str = r#"
    SELECT sp.id, sp.song_id, s.title AS song_title,
           sp.contributor_id, c.first_name, c.last_name, c.stage_name,
           sp.contributor_role_id, cr.name AS contributor_role_name, cr.category AS contributor_role_category,
           sp.music_group_id, g.name AS music_group_name,
           sp.music_group_role_id, gr.name AS music_group_role_name
    FROM song_performances sp
    JOIN songs s ON s.id = sp.song_id
    LEFT JOIN contributors c ON c.id = sp.contributor_id
    LEFT JOIN contributor_roles cr ON cr.id = sp.contributor_role_id
    LEFT JOIN music_groups g ON g.id = sp.music_group_id
    LEFT JOIN music_group_roles gr ON gr.id = sp.music_group_role_id
"#;

async fn load(pool: &SqlitePool, filter: &str, bind: i64) -> Result<Vec<SongPerformance>> {
    let rows = sqlx::query_as::<_, PerformanceRow>(&format!("{} WHERE {} ORDER BY sp.id", SELECT, filter))
        .bind(bind)
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(SongPerformance::try_from).collect()
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<SongPerformance> {
    load(pool, "sp.id = ?", id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::NotFound(format!("Song performance {}", id)))
}

pub async fn for_song(pool: &SqlitePool, song_id: i64) -> Result<Vec<SongPerformance>> {
    load(pool, "sp.song_id = ?", song_id).await
}

/// Performances on every song of an album
pub async fn for_album(pool: &SqlitePool, album_id: i64) -> Result<Vec<SongPerformance>> {
    load(
        pool,
        "sp.song_id IN (SELECT song_id FROM album_songs WHERE album_id = ?)",
        album_id,
    )
    .await
}

pub async fn for_contributor(pool: &SqlitePool, contributor_id: i64) -> Result<Vec<SongPerformance>> {
    load(pool, "sp.contributor_id = ?", contributor_id).await
}

pub async fn for_music_group(pool: &SqlitePool, music_group_id: i64) -> Result<Vec<SongPerformance>> {
    load(pool, "sp.music_group_id = ?", music_group_id).await
}

/// Resolve the performer side and check every referenced row exists
async fn clean(pool: &SqlitePool, form: &PerformanceForm) -> Result<PerformerIds> {
    let performer = form.clean()?;

    let mut errors = ValidationErrors::new();
    check_reference(pool, &mut errors, "song_id", "songs", Some(form.song_id)).await?;
    match performer {
        PerformerIds::Contributor { contributor_id, role_id } => {
            check_reference(pool, &mut errors, "contributor_id", "contributors", Some(contributor_id)).await?;
            check_reference(pool, &mut errors, "contributor_role_id", "contributor_roles", Some(role_id)).await?;
        }
        PerformerIds::MusicGroup { music_group_id, role_id } => {
            check_reference(pool, &mut errors, "music_group_id", "music_groups", Some(music_group_id)).await?;
            check_reference(pool, &mut errors, "music_group_role_id", "music_group_roles", Some(role_id)).await?;
        }
    }
    errors.into_result()?;
    Ok(performer)
}

pub async fn create(pool: &SqlitePool, form: &PerformanceForm) -> Result<SongPerformance> {
    let performer = clean(pool, form).await?;
    let (contributor_id, contributor_role_id, music_group_id, music_group_role_id) = performer.columns();

    let id = sqlx::query(
        r#"
        INSERT INTO song_performances
            (song_id, contributor_id, contributor_role_id, music_group_id, music_group_role_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(form.song_id)
    .bind(contributor_id)
    .bind(contributor_role_id)
    .bind(music_group_id)
    .bind(music_group_role_id)
    .execute(pool)
    .await?
    .last_insert_rowid();

    let performance = get(pool, id).await?;
    info!("Created song performance {} ({})", id, performance);
    Ok(performance)
}

pub async fn update(pool: &SqlitePool, id: i64, form: &PerformanceForm) -> Result<SongPerformance> {
    get(pool, id).await?;
    let performer = clean(pool, form).await?;
    let (contributor_id, contributor_role_id, music_group_id, music_group_role_id) = performer.columns();

    sqlx::query(
        r#"
        UPDATE song_performances SET
            song_id = ?, contributor_id = ?, contributor_role_id = ?,
            music_group_id = ?, music_group_role_id = ?
        WHERE id = ?
        "#,
    )
    .bind(form.song_id)
    .bind(contributor_id)
    .bind(contributor_role_id)
    .bind(music_group_id)
    .bind(music_group_role_id)
    .bind(id)
    .execute(pool)
    .await?;

    info!("Updated song performance {}", id);
    get(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM song_performances WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Song performance {}", id)));
    }
    info!("Deleted song performance {}", id);
    Ok(())
}
