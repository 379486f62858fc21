//! Contributors (individual people) and their previous names

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use super::listing::{self, ListFilter, ListSource, PageWindow};
use super::models::{AlbumRef, Contributor, ContributorPreviousName, ContributorRef, Lookup, Membership, SongRef};
use super::{check_reference, lookups, memberships, performances};
use crate::categorize::{self, CategorySongs};
use crate::forms::{ContributorForm, PreviousNameForm};
use crate::validation::ValidationErrors;
use crate::{Error, Result};

/// SQL for the display name: stage name, otherwise "first last"
pub(crate) const DISPLAY_NAME_SQL: &str = "COALESCE(NULLIF(stage_name, ''), first_name || ' ' || last_name)";

const COLUMNS: &str =
    "id, first_name, middle_name, last_name, stage_name, date_of_birth, date_of_death, country_id, bio";

const SOURCE: ListSource = ListSource {
    select: "SELECT id, first_name, middle_name, last_name, stage_name, date_of_birth, date_of_death, country_id, bio FROM contributors",
    from: "FROM contributors",
    sort_expr: DISPLAY_NAME_SQL,
    id_column: "id",
};

/// Everything shown on a contributor page
#[derive(Debug, Clone, Serialize)]
pub struct ContributorDetail {
    pub contributor: Contributor,
    pub display_name: String,
    pub display_more: String,
    pub country: Option<Lookup>,
    pub previous_names: Vec<ContributorPreviousName>,
    pub songs: Vec<SongRef>,
    pub albums: Vec<AlbumRef>,
    pub memberships: Vec<Membership>,
    pub songs_by_category: Vec<CategorySongs>,
}

pub async fn count(pool: &SqlitePool, filter: &ListFilter) -> Result<i64> {
    listing::count(pool, &SOURCE, filter).await
}

pub async fn list(pool: &SqlitePool, filter: &ListFilter, window: PageWindow) -> Result<Vec<Contributor>> {
    listing::fetch_page(pool, &SOURCE, filter, window).await
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Contributor> {
    sqlx::query_as::<_, Contributor>(&format!("SELECT {} FROM contributors WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Contributor {}", id)))
}

async fn clean(pool: &SqlitePool, form: &ContributorForm, today: NaiveDate) -> Result<ContributorForm> {
    let cleaned = form.clean(today)?;
    let mut errors = ValidationErrors::new();
    check_reference(pool, &mut errors, "country_id", "countries", cleaned.country_id).await?;
    errors.into_result()?;
    Ok(cleaned)
}

/// Create a contributor; `today` bounds the life dates
pub async fn create(pool: &SqlitePool, form: &ContributorForm, today: NaiveDate) -> Result<Contributor> {
    let c = clean(pool, form, today).await?;

    let id = sqlx::query(
        r#"
        INSERT INTO contributors
            (first_name, middle_name, last_name, stage_name, date_of_birth, date_of_death, country_id, bio)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&c.first_name)
    .bind(&c.middle_name)
    .bind(&c.last_name)
    .bind(&c.stage_name)
    .bind(c.date_of_birth)
    .bind(c.date_of_death)
    .bind(c.country_id)
    .bind(&c.bio)
    .execute(pool)
    .await?
    .last_insert_rowid();

    let contributor = get(pool, id).await?;
    info!("Created contributor {} '{}'", id, contributor.display_name());
    Ok(contributor)
}

pub async fn update(pool: &SqlitePool, id: i64, form: &ContributorForm, today: NaiveDate) -> Result<Contributor> {
    get(pool, id).await?;
    let c = clean(pool, form, today).await?;

    sqlx::query(
        r#"
        UPDATE contributors SET
            first_name = ?, middle_name = ?, last_name = ?, stage_name = ?,
            date_of_birth = ?, date_of_death = ?, country_id = ?, bio = ?
        WHERE id = ?
        "#,
    )
    .bind(&c.first_name)
    .bind(&c.middle_name)
    .bind(&c.last_name)
    .bind(&c.stage_name)
    .bind(c.date_of_birth)
    .bind(c.date_of_death)
    .bind(c.country_id)
    .bind(&c.bio)
    .bind(id)
    .execute(pool)
    .await?;

    info!("Updated contributor {}", id);
    get(pool, id).await
}

/// Delete a contributor with their previous names, memberships and performances
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM contributors WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Contributor {}", id)));
    }
    info!("Deleted contributor {}", id);
    Ok(())
}

// ===== Previous names =====

pub async fn list_previous_names(pool: &SqlitePool, contributor_id: i64) -> Result<Vec<ContributorPreviousName>> {
    let names = sqlx::query_as::<_, ContributorPreviousName>(
        r#"
        SELECT id, contributor_id, first_name, middle_name, last_name
        FROM contributor_previous_names
        WHERE contributor_id = ?
        ORDER BY id
        "#,
    )
    .bind(contributor_id)
    .fetch_all(pool)
    .await?;
    Ok(names)
}

pub async fn add_previous_name(
    pool: &SqlitePool,
    contributor_id: i64,
    form: &PreviousNameForm,
) -> Result<ContributorPreviousName> {
    get(pool, contributor_id).await?;
    let cleaned = form.clean()?;

    let id = sqlx::query(
        "INSERT INTO contributor_previous_names (contributor_id, first_name, middle_name, last_name) VALUES (?, ?, ?, ?)",
    )
    .bind(contributor_id)
    .bind(&cleaned.first_name)
    .bind(&cleaned.middle_name)
    .bind(&cleaned.last_name)
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!("Added previous name {} to contributor {}", id, contributor_id);
    Ok(ContributorPreviousName {
        id,
        contributor_id,
        first_name: cleaned.first_name,
        middle_name: cleaned.middle_name,
        last_name: cleaned.last_name,
    })
}

pub async fn delete_previous_name(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM contributor_previous_names WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Previous name {}", id)));
    }
    info!("Deleted previous name {}", id);
    Ok(())
}

// ===== Relations =====

/// Contributors behind the ids in `subquery`, which must select one id column
pub(crate) async fn refs_in(pool: &SqlitePool, subquery: &str, owner_id: i64) -> Result<Vec<ContributorRef>> {
    let refs = sqlx::query_as::<_, ContributorRef>(&format!(
        "SELECT id, {name} AS name FROM contributors WHERE id IN ({subquery}) ORDER BY {name} COLLATE NOCASE, id",
        name = DISPLAY_NAME_SQL,
        subquery = subquery,
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(refs)
}

/// Songs listing the contributor as an artist
pub async fn songs(pool: &SqlitePool, contributor_id: i64) -> Result<Vec<SongRef>> {
    let songs = sqlx::query_as::<_, SongRef>(
        r#"
        SELECT s.id, s.title
        FROM songs s
        JOIN song_artists sa ON sa.song_id = s.id
        WHERE sa.contributor_id = ?
        ORDER BY s.title COLLATE NOCASE, s.id
        "#,
    )
    .bind(contributor_id)
    .fetch_all(pool)
    .await?;
    Ok(songs)
}

/// Albums listing the contributor as an artist
pub async fn albums(pool: &SqlitePool, contributor_id: i64) -> Result<Vec<AlbumRef>> {
    let albums = sqlx::query_as::<_, AlbumRef>(
        r#"
        SELECT a.id, a.title
        FROM albums a
        JOIN album_artists aa ON aa.album_id = a.id
        WHERE aa.contributor_id = ?
        ORDER BY a.released IS NULL, a.released, a.title COLLATE NOCASE
        "#,
    )
    .bind(contributor_id)
    .fetch_all(pool)
    .await?;
    Ok(albums)
}

pub async fn detail(pool: &SqlitePool, id: i64) -> Result<ContributorDetail> {
    let contributor = get(pool, id).await?;

    let country = match contributor.country_id {
        Some(country_id) => Some(lookups::get(pool, lookups::LookupKind::Country, country_id).await?),
        None => None,
    };
    let credits = performances::for_contributor(pool, id).await?;

    Ok(ContributorDetail {
        display_name: contributor.display_name(),
        display_more: contributor.display_more(),
        country,
        previous_names: list_previous_names(pool, id).await?,
        songs: songs(pool, id).await?,
        albums: albums(pool, id).await?,
        memberships: memberships::for_member(pool, id).await?,
        songs_by_category: categorize::songs_grouped_by_category(&credits),
        contributor,
    })
}
