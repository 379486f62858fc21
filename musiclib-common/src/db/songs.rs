//! Songs and their artist, group and genre links

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use super::listing::{self, ListFilter, ListSource, PageWindow};
use super::models::{AlbumRef, ContributorRef, Lookup, MusicGroupRef, Song, SongPerformance};
use super::music_groups::{self, GroupMembers};
use super::{check_reference, check_references, contributors, lookups, performances, replace_links};
use crate::categorize::{self, CategoryCredits, RoleGroups, RoleMerge};
use crate::forms::SongForm;
use crate::validation::ValidationErrors;
use crate::{Error, Result};

const SOURCE: ListSource = ListSource {
    select: "SELECT id, title, duration, released, summary, lyrics, language_id FROM songs",
    from: "FROM songs",
    sort_expr: "title",
    id_column: "id",
};

/// Everything shown on a song page
#[derive(Debug, Clone, Serialize)]
pub struct SongDetail {
    pub song: Song,
    pub duration_formatted: Option<String>,
    pub language: Option<Lookup>,
    pub genres: Vec<Lookup>,
    pub artists: Vec<ContributorRef>,
    pub music_groups: Vec<MusicGroupRef>,
    /// First album the song appears on
    pub album: Option<AlbumRef>,
    pub performances: Vec<SongPerformance>,
    pub contributors_by_category: Vec<CategoryCredits>,
    pub groups_by_role: Vec<RoleGroups>,
    pub music_groups_with_members: Vec<GroupMembers>,
}

pub async fn count(pool: &SqlitePool, filter: &ListFilter) -> Result<i64> {
    listing::count(pool, &SOURCE, filter).await
}

pub async fn list(pool: &SqlitePool, filter: &ListFilter, window: PageWindow) -> Result<Vec<Song>> {
    listing::fetch_page(pool, &SOURCE, filter, window).await
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Song> {
    sqlx::query_as::<_, Song>(
        "SELECT id, title, duration, released, summary, lyrics, language_id FROM songs WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Song {}", id)))
}

async fn clean(pool: &SqlitePool, form: &SongForm) -> Result<SongForm> {
    let cleaned = form.clean()?;
    let mut errors = ValidationErrors::new();
    check_references(pool, &mut errors, "artist_ids", "contributors", &cleaned.artist_ids).await?;
    check_references(pool, &mut errors, "music_group_ids", "music_groups", &cleaned.music_group_ids).await?;
    check_references(pool, &mut errors, "genre_ids", "genres", &cleaned.genre_ids).await?;
    check_reference(pool, &mut errors, "language_id", "languages", cleaned.language_id).await?;
    errors.into_result()?;
    Ok(cleaned)
}

async fn write_links(tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>, id: i64, s: &SongForm) -> Result<()> {
    replace_links(tx, "song_artists", "song_id", id, "contributor_id", &s.artist_ids).await?;
    replace_links(tx, "song_music_groups", "song_id", id, "music_group_id", &s.music_group_ids).await?;
    replace_links(tx, "song_genres", "song_id", id, "genre_id", &s.genre_ids).await?;
    Ok(())
}

pub async fn create(pool: &SqlitePool, form: &SongForm) -> Result<Song> {
    let s = clean(pool, form).await?;

    let mut tx = pool.begin().await?;
    let id = sqlx::query(
        "INSERT INTO songs (title, duration, released, summary, lyrics, language_id) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&s.title)
    .bind(s.duration)
    .bind(s.released)
    .bind(&s.summary)
    .bind(&s.lyrics)
    .bind(s.language_id)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();
    write_links(&mut tx, id, &s).await?;
    tx.commit().await?;

    info!("Created song {} '{}'", id, s.title);
    get(pool, id).await
}

pub async fn update(pool: &SqlitePool, id: i64, form: &SongForm) -> Result<Song> {
    get(pool, id).await?;
    let s = clean(pool, form).await?;

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        UPDATE songs SET
            title = ?, duration = ?, released = ?, summary = ?, lyrics = ?, language_id = ?
        WHERE id = ?
        "#,
    )
    .bind(&s.title)
    .bind(s.duration)
    .bind(s.released)
    .bind(&s.summary)
    .bind(&s.lyrics)
    .bind(s.language_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;
    write_links(&mut tx, id, &s).await?;
    tx.commit().await?;

    info!("Updated song {}", id);
    get(pool, id).await
}

/// Delete a song; its performances and album tracks go with it
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM songs WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Song {}", id)));
    }
    info!("Deleted song {}", id);
    Ok(())
}

pub async fn genres(pool: &SqlitePool, song_id: i64) -> Result<Vec<Lookup>> {
    let genres = sqlx::query_as::<_, Lookup>(
        r#"
        SELECT g.id, g.name
        FROM genres g
        JOIN song_genres sg ON sg.genre_id = g.id
        WHERE sg.song_id = ?
        ORDER BY g.name COLLATE NOCASE
        "#,
    )
    .bind(song_id)
    .fetch_all(pool)
    .await?;
    Ok(genres)
}

/// The album with the lowest id that contains the song
pub async fn first_album(pool: &SqlitePool, song_id: i64) -> Result<Option<AlbumRef>> {
    let album = sqlx::query_as::<_, AlbumRef>(
        r#"
        SELECT a.id, a.title
        FROM albums a
        JOIN album_songs s ON s.album_id = a.id
        WHERE s.song_id = ?
        ORDER BY a.id
        LIMIT 1
        "#,
    )
    .bind(song_id)
    .fetch_optional(pool)
    .await?;
    Ok(album)
}

pub async fn detail(pool: &SqlitePool, id: i64) -> Result<SongDetail> {
    let song = get(pool, id).await?;

    let language = match song.language_id {
        Some(language_id) => Some(lookups::get(pool, lookups::LookupKind::Language, language_id).await?),
        None => None,
    };
    let performances = performances::for_song(pool, id).await?;
    let involved = categorize::involved_music_groups(&performances);

    Ok(SongDetail {
        duration_formatted: song.duration_formatted(),
        language,
        genres: genres(pool, id).await?,
        artists: contributors::refs_in(pool, "SELECT contributor_id FROM song_artists WHERE song_id = ?", id)
            .await?,
        music_groups: music_groups::refs_in(
            pool,
            "SELECT music_group_id FROM song_music_groups WHERE song_id = ?",
            id,
        )
        .await?,
        album: first_album(pool, id).await?,
        contributors_by_category: categorize::contributors_by_category(&performances, RoleMerge::FirstSeen),
        groups_by_role: categorize::groups_by_role(&performances),
        music_groups_with_members: music_groups::with_members(pool, involved).await?,
        performances,
        song,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::listing::SortOrder;
    use crate::db::init::init_memory_database;

    async fn insert(pool: &SqlitePool, sql: &str) -> i64 {
        sqlx::query(sql).execute(pool).await.unwrap().last_insert_rowid()
    }

    fn form(title: &str) -> SongForm {
        SongForm {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_with_links() {
        let pool = init_memory_database().await.unwrap();
        let artist = insert(&pool, "INSERT INTO contributors (first_name, last_name) VALUES ('John', 'Lennon')").await;
        let genre = insert(&pool, "INSERT INTO genres (name) VALUES ('Rock')").await;

        let mut f = form("Imagine");
        f.artist_ids = vec![artist];
        f.genre_ids = vec![genre, genre];
        f.duration = Some(183);
        let song = create(&pool, &f).await.unwrap();

        let detail = detail(&pool, song.id).await.unwrap();
        assert_eq!(detail.duration_formatted.as_deref(), Some("3:03"));
        assert_eq!(detail.artists[0].name, "John Lennon");
        assert_eq!(detail.genres.len(), 1);
        assert!(detail.album.is_none());
    }

    #[tokio::test]
    async fn test_unknown_link_rejected() {
        let pool = init_memory_database().await.unwrap();
        let mut f = form("Imagine");
        f.genre_ids = vec![12];
        f.language_id = Some(3);

        match create(&pool, &f).await {
            Err(Error::Validation(errors)) => {
                assert!(errors.has("genre_ids"));
                assert!(errors.has("language_id"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(count(&pool, &ListFilter::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_replaces_links() {
        let pool = init_memory_database().await.unwrap();
        let rock = insert(&pool, "INSERT INTO genres (name) VALUES ('Rock')").await;
        let pop = insert(&pool, "INSERT INTO genres (name) VALUES ('Pop')").await;

        let mut f = form("Help!");
        f.genre_ids = vec![rock];
        let song = create(&pool, &f).await.unwrap();

        f.genre_ids = vec![pop];
        update(&pool, song.id, &f).await.unwrap();
        let names: Vec<_> = genres(&pool, song.id).await.unwrap().into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["Pop"]);
    }

    #[tokio::test]
    async fn test_detail_merges_roles_per_category() {
        let pool = init_memory_database().await.unwrap();
        let song = create(&pool, &form("Yesterday")).await.unwrap();
        let paul = insert(&pool, "INSERT INTO contributors (first_name, last_name) VALUES ('Paul', 'McCartney')").await;
        let composer = insert(&pool, "INSERT INTO contributor_roles (name, category) VALUES ('Composer', 'writer')").await;
        let lyricist = insert(&pool, "INSERT INTO contributor_roles (name, category) VALUES ('Lyricist', 'writer')").await;
        for role in [composer, lyricist] {
            sqlx::query("INSERT INTO song_performances (song_id, contributor_id, contributor_role_id) VALUES (?, ?, ?)")
                .bind(song.id)
                .bind(paul)
                .bind(role)
                .execute(&pool)
                .await
                .unwrap();
        }

        let detail = detail(&pool, song.id).await.unwrap();
        assert_eq!(detail.contributors_by_category.len(), 1);
        let writers = &detail.contributors_by_category[0];
        assert_eq!(writers.label, "Writer");
        assert_eq!(writers.contributors.len(), 1);
        assert_eq!(writers.contributors[0].roles, vec!["Composer", "Lyricist"]);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let pool = init_memory_database().await.unwrap();
        let song = create(&pool, &form("Yesterday")).await.unwrap();
        let group = insert(&pool, "INSERT INTO music_groups (name) VALUES ('The Beatles')").await;
        let role = insert(&pool, "INSERT INTO music_group_roles (name) VALUES ('Band')").await;
        let album = insert(&pool, "INSERT INTO albums (title) VALUES ('Help!')").await;
        sqlx::query("INSERT INTO song_performances (song_id, music_group_id, music_group_role_id) VALUES (?, ?, ?)")
            .bind(song.id)
            .bind(group)
            .bind(role)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO album_songs (album_id, song_id, track_order) VALUES (?, ?, 1)")
            .bind(album)
            .bind(song.id)
            .execute(&pool)
            .await
            .unwrap();

        delete(&pool, song.id).await.unwrap();

        for table in ["song_performances", "album_songs"] {
            let left: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&pool)
                .await
                .unwrap();
            assert_eq!(left, 0, "{} not emptied", table);
        }
    }

    #[tokio::test]
    async fn test_list_desc() {
        let pool = init_memory_database().await.unwrap();
        for title in ["Abba", "beta", "Gamma"] {
            create(&pool, &form(title)).await.unwrap();
        }
        let titles: Vec<_> = list(&pool, &ListFilter::new(None, SortOrder::Desc), PageWindow { limit: 2, offset: 0 })
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["Gamma", "beta"]);
    }
}
