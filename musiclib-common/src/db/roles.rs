//! Contributor roles and music group roles

use sqlx::SqlitePool;
use tracing::{info, warn};

use super::listing::{self, ListFilter, ListSource, PageWindow};
use super::models::{ContributorRole, MusicGroupRole};
use crate::forms::{ContributorRoleForm, MusicGroupRoleForm};
use crate::validation::ValidationErrors;
use crate::{Error, Result};

const CONTRIBUTOR_ROLES: ListSource = ListSource {
    select: "SELECT id, name, category FROM contributor_roles",
    from: "FROM contributor_roles",
    sort_expr: "name",
    id_column: "id",
};

const MUSIC_GROUP_ROLES: ListSource = ListSource {
    select: "SELECT id, name FROM music_group_roles",
    from: "FROM music_group_roles",
    sort_expr: "name",
    id_column: "id",
};

/// Role names are unique as typed
async fn name_taken(pool: &SqlitePool, table: &str, name: &str, exclude_id: Option<i64>) -> Result<bool> {
    let taken: bool = sqlx::query_scalar(&format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE name = ? AND id IS NOT ?)",
        table
    ))
    .bind(name)
    .bind(exclude_id)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

fn duplicate_name(noun: &str, name: &str) -> Error {
    warn!("Rejected duplicate {} name '{}'", noun, name);
    let mut errors = ValidationErrors::new();
    errors.add("name", format!("A {} with this name already exists.", noun));
    errors.into()
}

/// Number of performances crediting a role through `column`
async fn performance_uses(pool: &SqlitePool, column: &str, role_id: i64) -> Result<i64> {
    let uses: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM song_performances WHERE {} = ?",
        column
    ))
    .bind(role_id)
    .fetch_one(pool)
    .await?;
    Ok(uses)
}

// ===== Contributor roles =====

pub async fn count_contributor_roles(pool: &SqlitePool, filter: &ListFilter) -> Result<i64> {
    listing::count(pool, &CONTRIBUTOR_ROLES, filter).await
}

pub async fn list_contributor_roles(
    pool: &SqlitePool,
    filter: &ListFilter,
    window: PageWindow,
) -> Result<Vec<ContributorRole>> {
    listing::fetch_page(pool, &CONTRIBUTOR_ROLES, filter, window).await
}

pub async fn get_contributor_role(pool: &SqlitePool, id: i64) -> Result<ContributorRole> {
    sqlx::query_as::<_, ContributorRole>("SELECT id, name, category FROM contributor_roles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Contributor role {}", id)))
}

pub async fn create_contributor_role(pool: &SqlitePool, form: &ContributorRoleForm) -> Result<ContributorRole> {
    let cleaned = form.clean()?;
    if name_taken(pool, "contributor_roles", &cleaned.name, None).await? {
        return Err(duplicate_name("contributor role", &cleaned.name));
    }

    let id = sqlx::query("INSERT INTO contributor_roles (name, category) VALUES (?, ?)")
        .bind(&cleaned.name)
        .bind(cleaned.category)
        .execute(pool)
        .await?
        .last_insert_rowid();

    info!("Created contributor role {} '{}' ({})", id, cleaned.name, cleaned.category);
    Ok(ContributorRole {
        id,
        name: cleaned.name,
        category: cleaned.category,
    })
}

pub async fn update_contributor_role(
    pool: &SqlitePool,
    id: i64,
    form: &ContributorRoleForm,
) -> Result<ContributorRole> {
    get_contributor_role(pool, id).await?;
    let cleaned = form.clean()?;
    if name_taken(pool, "contributor_roles", &cleaned.name, Some(id)).await? {
        return Err(duplicate_name("contributor role", &cleaned.name));
    }

    sqlx::query("UPDATE contributor_roles SET name = ?, category = ? WHERE id = ?")
        .bind(&cleaned.name)
        .bind(cleaned.category)
        .bind(id)
        .execute(pool)
        .await?;

    info!("Updated contributor role {}", id);
    Ok(ContributorRole {
        id,
        name: cleaned.name,
        category: cleaned.category,
    })
}

/// Delete a contributor role
///
/// Memberships lose the role; performances still crediting it block the delete.
pub async fn delete_contributor_role(pool: &SqlitePool, id: i64) -> Result<()> {
    let role = get_contributor_role(pool, id).await?;

    let uses = performance_uses(pool, "contributor_role_id", id).await?;
    if uses > 0 {
        warn!("Refused to delete contributor role {} used by {} performances", id, uses);
        return Err(Error::Conflict(format!(
            "Contributor role '{}' is used by {} song performance(s).",
            role.name, uses
        )));
    }

    sqlx::query("DELETE FROM contributor_roles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    info!("Deleted contributor role {} '{}'", id, role.name);
    Ok(())
}

// ===== Music group roles =====

pub async fn count_music_group_roles(pool: &SqlitePool, filter: &ListFilter) -> Result<i64> {
    listing::count(pool, &MUSIC_GROUP_ROLES, filter).await
}

pub async fn list_music_group_roles(
    pool: &SqlitePool,
    filter: &ListFilter,
    window: PageWindow,
) -> Result<Vec<MusicGroupRole>> {
    listing::fetch_page(pool, &MUSIC_GROUP_ROLES, filter, window).await
}

pub async fn get_music_group_role(pool: &SqlitePool, id: i64) -> Result<MusicGroupRole> {
    sqlx::query_as::<_, MusicGroupRole>("SELECT id, name FROM music_group_roles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Music group role {}", id)))
}

pub async fn create_music_group_role(pool: &SqlitePool, form: &MusicGroupRoleForm) -> Result<MusicGroupRole> {
    let cleaned = form.clean()?;
    if name_taken(pool, "music_group_roles", &cleaned.name, None).await? {
        return Err(duplicate_name("music group role", &cleaned.name));
    }

    let id = sqlx::query("INSERT INTO music_group_roles (name) VALUES (?)")
        .bind(&cleaned.name)
        .execute(pool)
        .await?
        .last_insert_rowid();

    info!("Created music group role {} '{}'", id, cleaned.name);
    Ok(MusicGroupRole { id, name: cleaned.name })
}

pub async fn update_music_group_role(
    pool: &SqlitePool,
    id: i64,
    form: &MusicGroupRoleForm,
) -> Result<MusicGroupRole> {
    get_music_group_role(pool, id).await?;
    let cleaned = form.clean()?;
    if name_taken(pool, "music_group_roles", &cleaned.name, Some(id)).await? {
        return Err(duplicate_name("music group role", &cleaned.name));
    }

    sqlx::query("UPDATE music_group_roles SET name = ? WHERE id = ?")
        .bind(&cleaned.name)
        .bind(id)
        .execute(pool)
        .await?;

    info!("Updated music group role {}", id);
    Ok(MusicGroupRole { id, name: cleaned.name })
}

pub async fn delete_music_group_role(pool: &SqlitePool, id: i64) -> Result<()> {
    let role = get_music_group_role(pool, id).await?;

    let uses = performance_uses(pool, "music_group_role_id", id).await?;
    if uses > 0 {
        warn!("Refused to delete music group role {} used by {} performances", id, uses);
        return Err(Error::Conflict(format!(
            "Music group role '{}' is used by {} song performance(s).",
            role.name, uses
        )));
    }

    sqlx::query("DELETE FROM music_group_roles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    info!("Deleted music group role {} '{}'", id, role.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;
    use crate::db::models::RoleCategory;

    fn contributor_role(name: &str, category: RoleCategory) -> ContributorRoleForm {
        ContributorRoleForm {
            name: name.to_string(),
            category,
        }
    }

    #[tokio::test]
    async fn test_contributor_role_crud() {
        let pool = init_memory_database().await.unwrap();
        let role = create_contributor_role(&pool, &contributor_role(" Lyricist ", RoleCategory::Writer))
            .await
            .unwrap();
        assert_eq!(role.name, "Lyricist");
        assert_eq!(get_contributor_role(&pool, role.id).await.unwrap().category, RoleCategory::Writer);

        let updated = update_contributor_role(&pool, role.id, &contributor_role("Lyricist", RoleCategory::Other))
            .await
            .unwrap();
        assert_eq!(updated.category, RoleCategory::Other);

        delete_contributor_role(&pool, role.id).await.unwrap();
        assert!(matches!(
            get_contributor_role(&pool, role.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_role_name() {
        let pool = init_memory_database().await.unwrap();
        create_music_group_role(&pool, &MusicGroupRoleForm { name: "Band".to_string() })
            .await
            .unwrap();

        match create_music_group_role(&pool, &MusicGroupRoleForm { name: "Band".to_string() }).await {
            Err(Error::Validation(errors)) => assert_eq!(
                errors.field("name"),
                ["A music group role with this name already exists.".to_string()]
            ),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_role_in_use_conflicts() {
        let pool = init_memory_database().await.unwrap();
        let role = create_contributor_role(&pool, &contributor_role("Singer", RoleCategory::Performer))
            .await
            .unwrap();

        let song_id = sqlx::query("INSERT INTO songs (title) VALUES ('Song')")
            .execute(&pool)
            .await
            .unwrap()
            .last_insert_rowid();
        let contributor_id =
            sqlx::query("INSERT INTO contributors (first_name, last_name) VALUES ('Karel', 'Gott')")
                .execute(&pool)
                .await
                .unwrap()
                .last_insert_rowid();
        sqlx::query("INSERT INTO song_performances (song_id, contributor_id, contributor_role_id) VALUES (?, ?, ?)")
            .bind(song_id)
            .bind(contributor_id)
            .bind(role.id)
            .execute(&pool)
            .await
            .unwrap();

        assert!(matches!(
            delete_contributor_role(&pool, role.id).await,
            Err(Error::Conflict(_))
        ));
        assert!(get_contributor_role(&pool, role.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_roles_ordered() {
        let pool = init_memory_database().await.unwrap();
        for name in ["Producer", "Composer", "arranger"] {
            create_contributor_role(&pool, &contributor_role(name, RoleCategory::Other))
                .await
                .unwrap();
        }

        let names: Vec<_> = list_contributor_roles(&pool, &ListFilter::default(), PageWindow::ALL)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["arranger", "Composer", "Producer"]);
    }
}
