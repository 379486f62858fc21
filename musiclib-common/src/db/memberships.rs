//! Contributor ↔ music group memberships with their roles

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::info;

use super::contributors::DISPLAY_NAME_SQL;
use super::models::{ContributorRef, ContributorRole, Membership, MusicGroupRef};
use super::{check_reference, check_references, replace_links};
use crate::format;
use crate::forms::MembershipForm;
use crate::validation::ValidationErrors;
use crate::{Error, Result};

#[derive(sqlx::FromRow)]
struct MembershipRow {
    id: i64,
    member_id: i64,
    member_name: String,
    music_group_id: i64,
    music_group_name: String,
    from_date: Option<NaiveDate>,
    to_date: Option<NaiveDate>,
}

fn select_sql(filter: &str) -> String {
    format!(
        r#"
        SELECT m.id, m.member_id, c.name AS member_name,
               m.music_group_id, g.name AS music_group_name,
               m.from_date, m.to_date
        FROM music_group_memberships m
        JOIN (SELECT id, {name} AS name FROM contributors) c ON c.id = m.member_id
        JOIN music_groups g ON g.id = m.music_group_id
        WHERE {filter}
        ORDER BY m.from_date IS NULL, m.from_date, m.id
        "#,
        name = DISPLAY_NAME_SQL,
        filter = filter,
    )
}

async fn roles_of(pool: &SqlitePool, membership_id: i64) -> Result<Vec<ContributorRole>> {
    let roles = sqlx::query_as::<_, ContributorRole>(
        r#"
        SELECT r.id, r.name, r.category
        FROM contributor_roles r
        JOIN membership_roles mr ON mr.role_id = r.id
        WHERE mr.membership_id = ?
        ORDER BY r.name
        "#,
    )
    .bind(membership_id)
    .fetch_all(pool)
    .await?;
    Ok(roles)
}

async fn load(pool: &SqlitePool, filter: &str, bind: i64) -> Result<Vec<Membership>> {
    let rows = sqlx::query_as::<_, MembershipRow>(&select_sql(filter))
        .bind(bind)
        .fetch_all(pool)
        .await?;

    let mut memberships = Vec::with_capacity(rows.len());
    for row in rows {
        memberships.push(Membership {
            id: row.id,
            member: ContributorRef {
                id: row.member_id,
                name: row.member_name,
            },
            music_group: MusicGroupRef {
                id: row.music_group_id,
                name: row.music_group_name,
            },
            roles: roles_of(pool, row.id).await?,
            from_date: row.from_date,
            to_date: row.to_date,
            active_period: format::active_period(row.from_date, row.to_date),
        });
    }
    Ok(memberships)
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Membership> {
    load(pool, "m.id = ?", id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::NotFound(format!("Membership {}", id)))
}

/// Groups a contributor belongs or belonged to
pub async fn for_member(pool: &SqlitePool, contributor_id: i64) -> Result<Vec<Membership>> {
    load(pool, "m.member_id = ?", contributor_id).await
}

/// Members of a music group, past and present
pub async fn for_music_group(pool: &SqlitePool, music_group_id: i64) -> Result<Vec<Membership>> {
    load(pool, "m.music_group_id = ?", music_group_id).await
}

async fn clean(pool: &SqlitePool, form: &MembershipForm) -> Result<MembershipForm> {
    let cleaned = form.clean()?;
    let mut errors = ValidationErrors::new();
    check_reference(pool, &mut errors, "member_id", "contributors", Some(cleaned.member_id)).await?;
    check_reference(pool, &mut errors, "music_group_id", "music_groups", Some(cleaned.music_group_id)).await?;
    check_references(pool, &mut errors, "role_ids", "contributor_roles", &cleaned.role_ids).await?;
    errors.into_result()?;
    Ok(cleaned)
}

pub async fn create(pool: &SqlitePool, form: &MembershipForm) -> Result<Membership> {
    let m = clean(pool, form).await?;

    let mut tx = pool.begin().await?;
    let id = sqlx::query(
        "INSERT INTO music_group_memberships (member_id, music_group_id, from_date, to_date) VALUES (?, ?, ?, ?)",
    )
    .bind(m.member_id)
    .bind(m.music_group_id)
    .bind(m.from_date)
    .bind(m.to_date)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();
    replace_links(&mut tx, "membership_roles", "membership_id", id, "role_id", &m.role_ids).await?;
    tx.commit().await?;

    info!(
        "Created membership {} (contributor {} in group {})",
        id, m.member_id, m.music_group_id
    );
    get(pool, id).await
}

pub async fn update(pool: &SqlitePool, id: i64, form: &MembershipForm) -> Result<Membership> {
    get(pool, id).await?;
    let m = clean(pool, form).await?;

    let mut tx = pool.begin().await?;
    sqlx::query(
        "UPDATE music_group_memberships SET member_id = ?, music_group_id = ?, from_date = ?, to_date = ? WHERE id = ?",
    )
    .bind(m.member_id)
    .bind(m.music_group_id)
    .bind(m.from_date)
    .bind(m.to_date)
    .bind(id)
    .execute(&mut *tx)
    .await?;
    replace_links(&mut tx, "membership_roles", "membership_id", id, "role_id", &m.role_ids).await?;
    tx.commit().await?;

    info!("Updated membership {}", id);
    get(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM music_group_memberships WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Membership {}", id)));
    }
    info!("Deleted membership {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;

    async fn seed(pool: &SqlitePool) -> (i64, i64, i64, i64) {
        let contributor = sqlx::query("INSERT INTO contributors (first_name, last_name) VALUES ('Petr', 'Novak')")
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid();
        let group = sqlx::query("INSERT INTO music_groups (name) VALUES ('George and Beatovens')")
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid();
        let singer = sqlx::query("INSERT INTO contributor_roles (name, category) VALUES ('Singer', 'performer')")
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid();
        let guitar = sqlx::query("INSERT INTO contributor_roles (name, category) VALUES ('Guitar', 'performer')")
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid();
        (contributor, group, singer, guitar)
    }

    #[tokio::test]
    async fn test_create_with_roles() {
        let pool = init_memory_database().await.unwrap();
        let (contributor, group, singer, guitar) = seed(&pool).await;

        let form = MembershipForm {
            member_id: contributor,
            music_group_id: group,
            role_ids: vec![singer, guitar, singer],
            from_date: NaiveDate::from_ymd_opt(1965, 1, 1),
            to_date: None,
        };
        let membership = create(&pool, &form).await.unwrap();

        assert_eq!(membership.member.name, "Petr Novak");
        assert_eq!(membership.display_roles(), "Guitar, Singer");
        assert_eq!(membership.active_period, "[1965-01-01–]");
        assert_eq!(for_music_group(&pool, group).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_roles() {
        let pool = init_memory_database().await.unwrap();
        let (contributor, group, singer, guitar) = seed(&pool).await;
        let mut form = MembershipForm {
            member_id: contributor,
            music_group_id: group,
            role_ids: vec![singer],
            ..Default::default()
        };
        let membership = create(&pool, &form).await.unwrap();

        form.role_ids = vec![guitar];
        let updated = update(&pool, membership.id, &form).await.unwrap();
        assert_eq!(updated.display_roles(), "Guitar");
    }

    #[tokio::test]
    async fn test_dangling_references_rejected() {
        let pool = init_memory_database().await.unwrap();
        let form = MembershipForm {
            member_id: 1,
            music_group_id: 1,
            role_ids: vec![5],
            ..Default::default()
        };

        match create(&pool, &form).await {
            Err(Error::Validation(errors)) => {
                assert!(errors.has("member_id"));
                assert!(errors.has("music_group_id"));
                assert_eq!(
                    errors.field("role_ids"),
                    ["Select a valid choice. 5 is not one of the available choices.".to_string()]
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_role_delete_unlinks_membership() {
        let pool = init_memory_database().await.unwrap();
        let (contributor, group, singer, _) = seed(&pool).await;
        let form = MembershipForm {
            member_id: contributor,
            music_group_id: group,
            role_ids: vec![singer],
            ..Default::default()
        };
        let membership = create(&pool, &form).await.unwrap();

        crate::db::roles::delete_contributor_role(&pool, singer).await.unwrap();
        assert!(get(&pool, membership.id).await.unwrap().roles.is_empty());
    }
}
