//! Versioned schema changes on top of the base tables
//!
//! Each entry in [`MIGRATIONS`] runs once, inside its own transaction, and
//! records its version in `schema_version`. Released entries are never edited;
//! changes go in a new entry.

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::Result;

struct Migration {
    version: i32,
    description: &'static str,
    statements: &'static [&'static str],
}

const MIGRATIONS: &[Migration] = &[
    // Tables themselves come from `create_schema`; v1 marks that baseline
    Migration {
        version: 1,
        description: "catalog baseline",
        statements: &[],
    },
    Migration {
        version: 2,
        description: "indexes for detail-page joins",
        statements: &[
            "CREATE INDEX IF NOT EXISTS idx_song_performances_song ON song_performances(song_id)",
            "CREATE INDEX IF NOT EXISTS idx_song_performances_contributor ON song_performances(contributor_id)",
            "CREATE INDEX IF NOT EXISTS idx_song_performances_group ON song_performances(music_group_id)",
            "CREATE INDEX IF NOT EXISTS idx_album_songs_album ON album_songs(album_id, track_order)",
            "CREATE INDEX IF NOT EXISTS idx_album_songs_song ON album_songs(song_id)",
            "CREATE INDEX IF NOT EXISTS idx_memberships_group ON music_group_memberships(music_group_id)",
            "CREATE INDEX IF NOT EXISTS idx_memberships_member ON music_group_memberships(member_id)",
        ],
    },
];

/// Version of the newest entry in [`MIGRATIONS`]
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Highest applied version; 0 for a database that never ran migrations
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let has_table: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
    )
    .fetch_one(pool)
    .await?;
    if has_table == 0 {
        return Ok(0);
    }

    let version: Option<i32> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await?;
    Ok(version.unwrap_or(0))
}

/// Apply every migration newer than the database
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let applied = get_schema_version(pool).await?;

    if applied > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema v{} is newer than this build (v{}); leaving it alone",
            applied, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > applied).collect();
    if pending.is_empty() {
        info!("Database schema at v{}, nothing to migrate", applied);
        return Ok(());
    }

    for migration in pending {
        let mut tx = pool.begin().await?;
        for statement in migration.statements {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
            .bind(migration.version)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Applied schema v{}: {}", migration.version, migration.description);
    }

    Ok(())
}
