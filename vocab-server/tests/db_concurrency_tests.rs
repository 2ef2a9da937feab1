//! Concurrent writes against an on-disk word store
//!
//! The in-memory test pool has a single connection, so lock contention only
//! shows up with a file-backed database and a real connection pool.

use chrono::NaiveDate;
use futures::future::join_all;
use sqlx::SqlitePool;
use vocab_common::{ReviewOutcome, Stage};
use vocab_server::db;
use vocab_server::models::{WordChanges, WordItem};

const CONCURRENT_REVIEWS: usize = 8;
const ROUNDS: usize = 20;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

async fn file_pool(dir: &tempfile::TempDir) -> SqlitePool {
    db::init_database_pool(&dir.path().join("vocab.db"))
        .await
        .unwrap()
}

async fn seed(pool: &SqlitePool, text: &str) -> String {
    let inserted = db::insert_words(pool, &[WordItem::new(text, "x")], today())
        .await
        .unwrap();
    inserted[0].id.clone()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reviews_of_one_word_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let pool = file_pool(&dir).await;

    for round in 0..ROUNDS {
        let id = seed(&pool, &format!("wane{}", round)).await;

        let reviews = (0..CONCURRENT_REVIEWS).map(|_| {
            let pool = pool.clone();
            let id = id.clone();
            tokio::spawn(async move {
                db::record_review(&pool, &id, ReviewOutcome::Known, today()).await
            })
        });

        for result in join_all(reviews).await {
            let reviewed = result.unwrap();
            assert!(reviewed.is_ok(), "round {}: {:?}", round, reviewed.err());
            assert!(reviewed.unwrap().is_some());
        }

        // Every review advanced the stage exactly once, capped at the top
        let word = db::get_word(&pool, &id).await.unwrap().unwrap();
        assert_eq!(word.stage.value(), (CONCURRENT_REVIEWS as u8).min(Stage::MAX));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reviews_race_detail_edits() {
    let dir = tempfile::tempdir().unwrap();
    let pool = file_pool(&dir).await;
    let id = seed(&pool, "lucid").await;

    let mut tasks = Vec::new();
    for i in 0..CONCURRENT_REVIEWS {
        let pool = pool.clone();
        let id = id.clone();
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                db::record_review(&pool, &id, ReviewOutcome::Known, today())
                    .await
                    .map(|word| word.is_some())
            } else {
                let changes = WordChanges {
                    detail: Some(format!("note {}", i)),
                    ..WordChanges::default()
                };
                db::update_word(&pool, &id, &changes)
                    .await
                    .map(|word| word.is_some())
            }
        }));
    }

    for result in join_all(tasks).await {
        let outcome = result.unwrap();
        assert!(matches!(outcome, Ok(true)), "{:?}", outcome.err());
    }

    let word = db::get_word(&pool, &id).await.unwrap().unwrap();
    assert_eq!(word.stage.value(), (CONCURRENT_REVIEWS as u8 / 2).min(Stage::MAX));
    assert!(word.detail.starts_with("note "));
}

#[tokio::test]
async fn test_review_of_missing_word_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let pool = file_pool(&dir).await;

    let reviewed = db::record_review(&pool, "no-such-id", ReviewOutcome::Known, today())
        .await
        .unwrap();
    assert!(reviewed.is_none());
}
