//! Database models and queries

pub mod albums;
pub mod contributors;
pub mod init;
pub mod listing;
pub mod lookups;
pub mod memberships;
pub mod migrations;
pub mod models;
pub mod music_groups;
pub mod performances;
pub mod roles;
pub mod search;
pub mod songs;

pub use init::*;
pub use listing::{ListFilter, PageWindow, SortOrder};
pub use migrations::*;
pub use models::*;

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::validation::{ValidationErrors, INVALID_CHOICE};
use crate::Result;

/// Whether a row with `id` exists in `table`
pub(crate) async fn row_exists(pool: &SqlitePool, table: &str, id: i64) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(&format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", table))
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Record a field error when an optional foreign key points nowhere
pub(crate) async fn check_reference(
    pool: &SqlitePool,
    errors: &mut ValidationErrors,
    field: &str,
    table: &str,
    id: Option<i64>,
) -> Result<()> {
    if let Some(id) = id {
        if !row_exists(pool, table, id).await? {
            errors.add(field, INVALID_CHOICE);
        }
    }
    Ok(())
}

/// Record a field error for every id of a many-to-many selection that points nowhere
pub(crate) async fn check_references(
    pool: &SqlitePool,
    errors: &mut ValidationErrors,
    field: &str,
    table: &str,
    ids: &[i64],
) -> Result<()> {
    for &id in ids {
        if !row_exists(pool, table, id).await? {
            errors.add(
                field,
                format!("Select a valid choice. {} is not one of the available choices.", id),
            );
        }
    }
    Ok(())
}

/// Replace the link rows of one owner in a join table
pub(crate) async fn replace_links(
    tx: &mut Transaction<'_, Sqlite>,
    table: &str,
    owner_column: &str,
    owner_id: i64,
    target_column: &str,
    target_ids: &[i64],
) -> Result<()> {
    sqlx::query(&format!("DELETE FROM {} WHERE {} = ?", table, owner_column))
        .bind(owner_id)
        .execute(&mut **tx)
        .await?;

    for &target_id in target_ids {
        sqlx::query(&format!(
            "INSERT INTO {} ({}, {}) VALUES (?, ?)",
            table, owner_column, target_column
        ))
        .bind(owner_id)
        .bind(target_id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}
