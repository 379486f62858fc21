//! Substring search across the catalog

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use super::contributors::DISPLAY_NAME_SQL;
use super::listing::escape_like;
use super::models::{AlbumRef, ContributorRef, MusicGroupRef, SongRef};
use crate::Result;

/// Matches per entity type, each sorted by its display text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub songs: Vec<SongRef>,
    pub albums: Vec<AlbumRef>,
    pub contributors: Vec<ContributorRef>,
    pub music_groups: Vec<MusicGroupRef>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty() && self.albums.is_empty() && self.contributors.is_empty() && self.music_groups.is_empty()
    }
}

/// Case-insensitive "contains" search; at most `limit` rows per type
///
/// Contributors match on first, last or stage name. A blank query matches nothing.
pub async fn search_catalog(pool: &SqlitePool, query: &str, limit: i64) -> Result<SearchResults> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(SearchResults::default());
    }
    let pattern = format!("%{}%", escape_like(query));

    let songs = sqlx::query_as::<_, SongRef>(
        r#"
        SELECT id, title FROM songs
        WHERE title LIKE ?1 ESCAPE '\'
        ORDER BY title COLLATE NOCASE, id
        LIMIT ?2
        "#,
    )
    .bind(&pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let albums = sqlx::query_as::<_, AlbumRef>(
        r#"
        SELECT id, title FROM albums
        WHERE title LIKE ?1 ESCAPE '\'
        ORDER BY title COLLATE NOCASE, id
        LIMIT ?2
        "#,
    )
    .bind(&pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let contributors = sqlx::query_as::<_, ContributorRef>(&format!(
        r#"
        SELECT id, {name} AS name FROM contributors
        WHERE first_name LIKE ?1 ESCAPE '\'
           OR last_name LIKE ?1 ESCAPE '\'
           OR stage_name LIKE ?1 ESCAPE '\'
        ORDER BY {name} COLLATE NOCASE, id
        LIMIT ?2
        "#,
        name = DISPLAY_NAME_SQL
    ))
    .bind(&pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let music_groups = sqlx::query_as::<_, MusicGroupRef>(
        r#"
        SELECT id, name FROM music_groups
        WHERE name LIKE ?1 ESCAPE '\'
        ORDER BY name COLLATE NOCASE, id
        LIMIT ?2
        "#,
    )
    .bind(&pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let results = SearchResults {
        songs,
        albums,
        contributors,
        music_groups,
    };
    debug!(
        "Search '{}': {} songs, {} albums, {} contributors, {} groups",
        query,
        results.songs.len(),
        results.albums.len(),
        results.contributors.len(),
        results.music_groups.len()
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;

    async fn seed(pool: &SqlitePool) {
        for sql in [
            "INSERT INTO songs (title) VALUES ('Lady Carneval')",
            "INSERT INTO songs (title) VALUES ('Trezor')",
            "INSERT INTO albums (title) VALUES ('Karel Gott zpiva')",
            "INSERT INTO contributors (first_name, last_name) VALUES ('Karel', 'Gott')",
            "INSERT INTO contributors (first_name, last_name, stage_name) VALUES ('Reginald', 'Dwight', 'Elton John')",
            "INSERT INTO music_groups (name) VALUES ('Karel Zich Band')",
            "INSERT INTO music_groups (name) VALUES ('100% Rock')",
        ] {
            sqlx::query(sql).execute(pool).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_search_all_types() {
        let pool = init_memory_database().await.unwrap();
        seed(&pool).await;

        let results = search_catalog(&pool, "KAREL", 10).await.unwrap();
        assert!(results.songs.is_empty());
        assert_eq!(results.albums.len(), 1);
        assert_eq!(results.contributors[0].name, "Karel Gott");
        assert_eq!(results.music_groups[0].name, "Karel Zich Band");
    }

    #[tokio::test]
    async fn test_search_stage_name_and_limit() {
        let pool = init_memory_database().await.unwrap();
        seed(&pool).await;

        let results = search_catalog(&pool, "elton", 10).await.unwrap();
        assert_eq!(results.contributors[0].name, "Elton John");

        let limited = search_catalog(&pool, "e", 1).await.unwrap();
        assert_eq!(limited.songs.len(), 1);
    }

    #[tokio::test]
    async fn test_search_wildcards_are_literal() {
        let pool = init_memory_database().await.unwrap();
        seed(&pool).await;

        let results = search_catalog(&pool, "%", 10).await.unwrap();
        assert_eq!(results.music_groups.len(), 1);
        assert!(results.songs.is_empty());
    }

    #[tokio::test]
    async fn test_blank_query() {
        let pool = init_memory_database().await.unwrap();
        seed(&pool).await;
        assert!(search_catalog(&pool, "   ", 10).await.unwrap().is_empty());
    }
}
