//! Database initialization
//!
//! Creates the catalog schema on first run and opens existing databases
//! without touching their data. Every `CREATE` is idempotent.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Open (creating if needed) the catalog database at `db_path`
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    crate::db::migrations::run_migrations(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema
///
/// Limited to a single connection that never expires: every SQLite
/// `:memory:` connection is its own database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    crate::db::migrations::run_migrations(&pool).await?;

    Ok(pool)
}

/// Create every catalog table (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;

    // Lookup tables
    create_lookup_table(pool, "genres").await?;
    create_lookup_table(pool, "countries").await?;
    create_lookup_table(pool, "languages").await?;

    // People and groups
    create_contributors_table(pool).await?;
    create_contributor_previous_names_table(pool).await?;
    create_contributor_roles_table(pool).await?;
    create_music_group_roles_table(pool).await?;
    create_music_groups_table(pool).await?;
    create_music_group_memberships_table(pool).await?;

    // Songs and albums
    create_songs_table(pool).await?;
    create_song_links_tables(pool).await?;
    create_song_performances_table(pool).await?;
    create_albums_table(pool).await?;
    create_album_links_tables(pool).await?;
    create_album_songs_table(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_lookup_table(pool: &SqlitePool, table: &str) -> Result<()> {
    // Uniqueness is also checked case-insensitively (Unicode) before writes
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE
        )
        "#,
        table
    ))
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_contributors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contributors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            middle_name TEXT,
            last_name TEXT NOT NULL,
            stage_name TEXT,
            date_of_birth TEXT,
            date_of_death TEXT,
            country_id INTEGER REFERENCES countries(id) ON DELETE SET NULL,
            bio TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_contributor_previous_names_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contributor_previous_names (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            contributor_id INTEGER NOT NULL REFERENCES contributors(id) ON DELETE CASCADE,
            first_name TEXT NOT NULL,
            middle_name TEXT,
            last_name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_contributor_roles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contributor_roles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            category TEXT NOT NULL DEFAULT 'other'
                CHECK (category IN ('writer', 'performer', 'producer', 'publisher', 'other'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_music_group_roles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS music_group_roles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_music_groups_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS music_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            bio TEXT,
            founded TEXT,
            disbanded TEXT,
            country_id INTEGER REFERENCES countries(id) ON DELETE SET NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_music_group_memberships_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS music_group_memberships (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            member_id INTEGER NOT NULL REFERENCES contributors(id) ON DELETE CASCADE,
            music_group_id INTEGER NOT NULL REFERENCES music_groups(id) ON DELETE CASCADE,
            from_date TEXT,
            to_date TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS membership_roles (
            membership_id INTEGER NOT NULL REFERENCES music_group_memberships(id) ON DELETE CASCADE,
            role_id INTEGER NOT NULL REFERENCES contributor_roles(id) ON DELETE CASCADE,
            PRIMARY KEY (membership_id, role_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            duration INTEGER CHECK (duration IS NULL OR duration >= 0),
            released TEXT,
            summary TEXT,
            lyrics TEXT,
            language_id INTEGER REFERENCES languages(id) ON DELETE SET NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_song_links_tables(pool: &SqlitePool) -> Result<()> {
    for (table, column, target) in [
        ("song_artists", "contributor_id", "contributors"),
        ("song_music_groups", "music_group_id", "music_groups"),
        ("song_genres", "genre_id", "genres"),
    ] {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                song_id INTEGER NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
                {column} INTEGER NOT NULL REFERENCES {target}(id) ON DELETE CASCADE,
                PRIMARY KEY (song_id, {column})
            )
            "#
        ))
        .execute(pool)
        .await?;
    }

    Ok(())
}

async fn create_song_performances_table(pool: &SqlitePool) -> Result<()> {
    // Roles are RESTRICT: nulling a role would break the contributor_or_group check
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS song_performances (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            song_id INTEGER NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
            contributor_id INTEGER REFERENCES contributors(id) ON DELETE CASCADE,
            contributor_role_id INTEGER REFERENCES contributor_roles(id) ON DELETE RESTRICT,
            music_group_id INTEGER REFERENCES music_groups(id) ON DELETE CASCADE,
            music_group_role_id INTEGER REFERENCES music_group_roles(id) ON DELETE RESTRICT,
            CONSTRAINT contributor_or_group CHECK (
                (contributor_id IS NOT NULL AND contributor_role_id IS NOT NULL
                    AND music_group_id IS NULL AND music_group_role_id IS NULL)
                OR
                (contributor_id IS NULL AND contributor_role_id IS NULL
                    AND music_group_id IS NOT NULL AND music_group_role_id IS NOT NULL)
            )
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_albums_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS albums (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            released TEXT,
            summary TEXT,
            cover_image TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_album_links_tables(pool: &SqlitePool) -> Result<()> {
    for (table, column, target) in [
        ("album_artists", "contributor_id", "contributors"),
        ("album_music_groups", "music_group_id", "music_groups"),
    ] {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                album_id INTEGER NOT NULL REFERENCES albums(id) ON DELETE CASCADE,
                {column} INTEGER NOT NULL REFERENCES {target}(id) ON DELETE CASCADE,
                PRIMARY KEY (album_id, {column})
            )
            "#
        ))
        .execute(pool)
        .await?;
    }

    Ok(())
}

async fn create_album_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS album_songs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            album_id INTEGER NOT NULL REFERENCES albums(id) ON DELETE CASCADE,
            song_id INTEGER NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
            track_order INTEGER CHECK (track_order IS NULL OR track_order > 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let pool = init_memory_database().await.unwrap();
        create_schema(&pool).await.unwrap();

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(tables, 20);
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = init_memory_database().await.unwrap();
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
