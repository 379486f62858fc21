//! Tests for database creation, reopening and schema constraints

use musiclib_common::db::{get_schema_version, init_database, init_memory_database, CURRENT_SCHEMA_VERSION};

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sub").join("musiclib.db");

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing_and_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("musiclib.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO genres (name) VALUES ('Jazz')")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);
}

#[tokio::test]
async fn test_performance_check_rejects_raw_insert_with_both_sides() {
    let pool = init_memory_database().await.unwrap();
    for sql in [
        "INSERT INTO songs (id, title) VALUES (1, 'Song')",
        "INSERT INTO contributors (id, first_name, last_name) VALUES (1, 'A', 'B')",
        "INSERT INTO contributor_roles (id, name) VALUES (1, 'Singer')",
        "INSERT INTO music_groups (id, name) VALUES (1, 'Group')",
        "INSERT INTO music_group_roles (id, name) VALUES (1, 'Band')",
    ] {
        sqlx::query(sql).execute(&pool).await.unwrap();
    }

    let both = sqlx::query(
        "INSERT INTO song_performances (song_id, contributor_id, contributor_role_id, music_group_id, music_group_role_id) VALUES (1, 1, 1, 1, 1)",
    )
    .execute(&pool)
    .await;
    assert!(both.is_err(), "row with both sides was accepted");

    let neither = sqlx::query("INSERT INTO song_performances (song_id) VALUES (1)")
        .execute(&pool)
        .await;
    assert!(neither.is_err(), "row with no performer was accepted");

    let missing_role = sqlx::query("INSERT INTO song_performances (song_id, contributor_id) VALUES (1, 1)")
        .execute(&pool)
        .await;
    assert!(missing_role.is_err(), "contributor without role was accepted");

    let ok = sqlx::query("INSERT INTO song_performances (song_id, music_group_id, music_group_role_id) VALUES (1, 1, 1)")
        .execute(&pool)
        .await;
    assert!(ok.is_ok());
}

#[tokio::test]
async fn test_lookup_names_unique_ignoring_case() {
    let pool = init_memory_database().await.unwrap();
    sqlx::query("INSERT INTO countries (name) VALUES ('Czechia')")
        .execute(&pool)
        .await
        .unwrap();

    let duplicate = sqlx::query("INSERT INTO countries (name) VALUES ('CZECHIA')")
        .execute(&pool)
        .await;
    assert!(duplicate.is_err());
}

#[tokio::test]
async fn test_country_delete_nulls_contributor_country() {
    let pool = init_memory_database().await.unwrap();
    sqlx::query("INSERT INTO countries (id, name) VALUES (1, 'Czechia')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO contributors (id, first_name, last_name, country_id) VALUES (1, 'Karel', 'Gott', 1)")
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query("DELETE FROM countries WHERE id = 1")
        .execute(&pool)
        .await
        .unwrap();

    let country: Option<i64> = sqlx::query_scalar("SELECT country_id FROM contributors WHERE id = 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(country, None);
}
