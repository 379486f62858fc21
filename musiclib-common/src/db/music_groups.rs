//! Music groups (bands, ensembles)

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::listing::{self, ListFilter, ListSource, PageWindow};
use super::models::{AlbumRef, ContributorRef, Lookup, Membership, MusicGroup, MusicGroupRef, Performer, SongRef};
use super::{check_reference, contributors, lookups, memberships, performances};
use crate::categorize::SongCredit;
use crate::forms::MusicGroupForm;
use crate::validation::ValidationErrors;
use crate::{Error, Result};

const SOURCE: ListSource = ListSource {
    select: "SELECT id, name, bio, founded, disbanded, country_id FROM music_groups",
    from: "FROM music_groups",
    sort_expr: "name",
    id_column: "id",
};

/// A credited group with the people who were ever in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupMembers {
    pub music_group: MusicGroupRef,
    pub members: Vec<ContributorRef>,
}

/// Everything shown on a music group page
#[derive(Debug, Clone, Serialize)]
pub struct MusicGroupDetail {
    pub music_group: MusicGroup,
    pub country: Option<Lookup>,
    pub members: Vec<Membership>,
    pub albums: Vec<AlbumRef>,
    pub songs: Vec<SongRef>,
    /// Songs the group is credited on, with the role
    pub credits: Vec<SongCredit>,
}

pub async fn count(pool: &SqlitePool, filter: &ListFilter) -> Result<i64> {
    listing::count(pool, &SOURCE, filter).await
}

pub async fn list(pool: &SqlitePool, filter: &ListFilter, window: PageWindow) -> Result<Vec<MusicGroup>> {
    listing::fetch_page(pool, &SOURCE, filter, window).await
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<MusicGroup> {
    sqlx::query_as::<_, MusicGroup>(
        "SELECT id, name, bio, founded, disbanded, country_id FROM music_groups WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Music group {}", id)))
}

async fn clean(pool: &SqlitePool, form: &MusicGroupForm, exclude_id: Option<i64>) -> Result<MusicGroupForm> {
    let cleaned = form.clean()?;
    let mut errors = ValidationErrors::new();

    let taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM music_groups WHERE name = ? AND id IS NOT ?)")
            .bind(&cleaned.name)
            .bind(exclude_id)
            .fetch_one(pool)
            .await?;
    if taken {
        warn!("Rejected duplicate music group name '{}'", cleaned.name);
        errors.add("name", "A music group with this name already exists.");
    }
    check_reference(pool, &mut errors, "country_id", "countries", cleaned.country_id).await?;

    errors.into_result()?;
    Ok(cleaned)
}

pub async fn create(pool: &SqlitePool, form: &MusicGroupForm) -> Result<MusicGroup> {
    let g = clean(pool, form, None).await?;

    let id = sqlx::query(
        "INSERT INTO music_groups (name, bio, founded, disbanded, country_id) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&g.name)
    .bind(&g.bio)
    .bind(g.founded)
    .bind(g.disbanded)
    .bind(g.country_id)
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!("Created music group {} '{}'", id, g.name);
    get(pool, id).await
}

pub async fn update(pool: &SqlitePool, id: i64, form: &MusicGroupForm) -> Result<MusicGroup> {
    get(pool, id).await?;
    let g = clean(pool, form, Some(id)).await?;

    sqlx::query(
        "UPDATE music_groups SET name = ?, bio = ?, founded = ?, disbanded = ?, country_id = ? WHERE id = ?",
    )
    .bind(&g.name)
    .bind(&g.bio)
    .bind(g.founded)
    .bind(g.disbanded)
    .bind(g.country_id)
    .bind(id)
    .execute(pool)
    .await?;

    info!("Updated music group {}", id);
    get(pool, id).await
}

/// Delete a group with its memberships and performances
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM music_groups WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Music group {}", id)));
    }
    info!("Deleted music group {}", id);
    Ok(())
}

/// Groups behind the ids in `subquery`, which must select one id column
pub(crate) async fn refs_in(pool: &SqlitePool, subquery: &str, owner_id: i64) -> Result<Vec<MusicGroupRef>> {
    let refs = sqlx::query_as::<_, MusicGroupRef>(&format!(
        "SELECT id, name FROM music_groups WHERE id IN ({}) ORDER BY name COLLATE NOCASE, id",
        subquery
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(refs)
}

/// Attach the member list to each group, keeping the given order
pub async fn with_members(pool: &SqlitePool, groups: Vec<MusicGroupRef>) -> Result<Vec<GroupMembers>> {
    let mut result = Vec::with_capacity(groups.len());
    for music_group in groups {
        let members = contributors::refs_in(
            pool,
            "SELECT member_id FROM music_group_memberships WHERE music_group_id = ?",
            music_group.id,
        )
        .await?;
        result.push(GroupMembers { music_group, members });
    }
    Ok(result)
}

pub async fn albums(pool: &SqlitePool, music_group_id: i64) -> Result<Vec<AlbumRef>> {
    let albums = sqlx::query_as::<_, AlbumRef>(
        r#"
        SELECT a.id, a.title
        FROM albums a
        JOIN album_music_groups ag ON ag.album_id = a.id
        WHERE ag.music_group_id = ?
        ORDER BY a.released IS NULL, a.released, a.title COLLATE NOCASE
        "#,
    )
    .bind(music_group_id)
    .fetch_all(pool)
    .await?;
    Ok(albums)
}

pub async fn songs(pool: &SqlitePool, music_group_id: i64) -> Result<Vec<SongRef>> {
    let songs = sqlx::query_as::<_, SongRef>(
        r#"
        SELECT s.id, s.title
        FROM songs s
        JOIN song_music_groups sg ON sg.song_id = s.id
        WHERE sg.music_group_id = ?
        ORDER BY s.title COLLATE NOCASE, s.id
        "#,
    )
    .bind(music_group_id)
    .fetch_all(pool)
    .await?;
    Ok(songs)
}

pub async fn detail(pool: &SqlitePool, id: i64) -> Result<MusicGroupDetail> {
    let music_group = get(pool, id).await?;

    let country = match music_group.country_id {
        Some(country_id) => Some(lookups::get(pool, lookups::LookupKind::Country, country_id).await?),
        None => None,
    };
    let credits = performances::for_music_group(pool, id)
        .await?
        .into_iter()
        .filter_map(|p| match p.performer {
            Performer::MusicGroup { role, .. } => Some(SongCredit {
                song: p.song,
                role: role.name,
            }),
            Performer::Contributor { .. } => None,
        })
        .collect();

    Ok(MusicGroupDetail {
        country,
        members: memberships::for_music_group(pool, id).await?,
        albums: albums(pool, id).await?,
        songs: songs(pool, id).await?,
        credits,
        music_group,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;
    use chrono::NaiveDate;

    fn form(name: &str) -> MusicGroupForm {
        MusicGroupForm {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unique_name() {
        let pool = init_memory_database().await.unwrap();
        let group = create(&pool, &form("Olympic")).await.unwrap();

        match create(&pool, &form("Olympic")).await {
            Err(Error::Validation(errors)) => assert!(errors.has("name")),
            other => panic!("expected validation error, got {:?}", other),
        }
        // Saving a group under its own name is fine
        update(&pool, group.id, &form("Olympic")).await.unwrap();
    }

    #[tokio::test]
    async fn test_albums_ordered_by_release() {
        let pool = init_memory_database().await.unwrap();
        let group = create(&pool, &form("Olympic")).await.unwrap();

        for (title, released) in [("Prazdniny na Zemi", "1980-01-01"), ("Zelva", "1968-01-01")] {
            let album_id = sqlx::query("INSERT INTO albums (title, released) VALUES (?, ?)")
                .bind(title)
                .bind(released)
                .execute(&pool)
                .await
                .unwrap()
                .last_insert_rowid();
            sqlx::query("INSERT INTO album_music_groups (album_id, music_group_id) VALUES (?, ?)")
                .bind(album_id)
                .bind(group.id)
                .execute(&pool)
                .await
                .unwrap();
        }

        let titles: Vec<_> = albums(&pool, group.id)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["Zelva", "Prazdniny na Zemi"]);
    }

    #[tokio::test]
    async fn test_detail_lists_members() {
        let pool = init_memory_database().await.unwrap();
        let group = create(
            &pool,
            &MusicGroupForm {
                name: "Golden Kids".to_string(),
                founded: NaiveDate::from_ymd_opt(1968, 1, 1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let member = sqlx::query("INSERT INTO contributors (first_name, last_name) VALUES ('Marta', 'Kubisova')")
            .execute(&pool)
            .await
            .unwrap()
            .last_insert_rowid();
        sqlx::query("INSERT INTO music_group_memberships (member_id, music_group_id) VALUES (?, ?)")
            .bind(member)
            .bind(group.id)
            .execute(&pool)
            .await
            .unwrap();

        let detail = detail(&pool, group.id).await.unwrap();
        assert_eq!(detail.members.len(), 1);
        assert_eq!(detail.members[0].member.name, "Marta Kubisova");

        let with = with_members(&pool, vec![group.to_ref()]).await.unwrap();
        assert_eq!(with[0].members[0].id, member);
    }
}
