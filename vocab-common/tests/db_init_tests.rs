//! Database initialization against on-disk files

use vocab_common::db::{init_database, schema_version, SCHEMA_VERSION};

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sub").join("vocab.db");

    let pool = init_database(&db_path).await;
    assert!(pool.is_ok(), "Database initialization failed: {:?}", pool.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("vocab.db");

    let first = init_database(&db_path).await.unwrap();
    first.close().await;

    let second = init_database(&db_path).await;
    assert!(second.is_ok(), "Failed to reopen database: {:?}", second.err());

    let version = schema_version(&second.unwrap()).await.unwrap();
    assert_eq!(version, Some(SCHEMA_VERSION));
}

#[tokio::test]
async fn test_words_table_rejects_out_of_range_stage() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("vocab.db")).await.unwrap();

    let result = sqlx::query(
        "INSERT INTO words (id, text, translation, stage, next_review_date, created_at)
         VALUES ('a', 'w', 't', 7, '2024-01-01', '2024-01-01T00:00:00Z')",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "stage 7 should violate the CHECK constraint");
}

#[tokio::test]
async fn test_detail_defaults_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("vocab.db")).await.unwrap();

    sqlx::query(
        "INSERT INTO words (id, text, translation, next_review_date, created_at)
         VALUES ('a', 'w', 't', '2024-01-01', '2024-01-01T00:00:00Z')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let (stage, detail): (i64, String) =
        sqlx::query_as("SELECT stage, detail FROM words WHERE id = 'a'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stage, 0);
    assert_eq!(detail, "");
}
