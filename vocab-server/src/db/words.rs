//! Word record persistence
//!
//! Every function takes the shared pool explicitly. Multi-statement
//! operations (batch import, review) run inside a transaction.

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;
use vocab_common::srs::{apply_review, ReviewOutcome};
use vocab_common::time::to_storage_timestamp;
use vocab_common::{Error, Result, Stage};

use crate::models::{WordChanges, WordItem, WordRecord};

const WORD_COLUMNS: &str = "id, text, translation, stage, next_review_date, detail, created_at";

fn row_to_word(row: &SqliteRow) -> Result<WordRecord> {
    let id: String = row.try_get("id")?;

    let raw_stage: i64 = row.try_get("stage")?;
    let stage = Stage::try_from(raw_stage).unwrap_or_else(|_| {
        warn!(id = %id, stage = raw_stage, "Stored stage out of range, clamping");
        Stage::clamped(raw_stage)
    });

    let created_at_str: String = row.try_get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| Error::Internal(format!("Bad created_at '{}' on {}: {}", created_at_str, id, e)))?
        .with_timezone(&Utc);

    Ok(WordRecord {
        text: row.try_get("text")?,
        translation: row.try_get("translation")?,
        stage,
        next_review_date: row.try_get::<NaiveDate, _>("next_review_date")?,
        detail: row.try_get("detail")?,
        created_at,
        id,
    })
}

/// All records, newest first
pub async fn list_words(pool: &SqlitePool) -> Result<Vec<WordRecord>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM words ORDER BY created_at DESC, rowid DESC",
        WORD_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_word).collect()
}

/// Single record by id
pub async fn get_word(pool: &SqlitePool, id: &str) -> Result<Option<WordRecord>> {
    let row = sqlx::query(&format!("SELECT {} FROM words WHERE id = ?", WORD_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_word).transpose()
}

/// Insert new words at stage 0, due on `today`
///
/// Items must already be normalized. Either all rows are inserted or none.
pub async fn insert_words(
    pool: &SqlitePool,
    items: &[WordItem],
    today: NaiveDate,
) -> Result<Vec<WordRecord>> {
    let mut tx = pool.begin().await?;
    let mut inserted = Vec::with_capacity(items.len());

    for item in items {
        let record = WordRecord {
            id: Uuid::new_v4().to_string(),
            text: item.text.clone(),
            translation: item.translation.clone(),
            stage: Stage::NEW,
            next_review_date: today,
            detail: String::new(),
            // Stored with microsecond precision
            created_at: Utc::now().trunc_subsecs(6),
        };

        sqlx::query(
            r#"
            INSERT INTO words (id, text, translation, stage, next_review_date, detail, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.text)
        .bind(&record.translation)
        .bind(i64::from(record.stage))
        .bind(record.next_review_date)
        .bind(&record.detail)
        .bind(to_storage_timestamp(record.created_at))
        .execute(&mut *tx)
        .await?;

        inserted.push(record);
    }

    tx.commit().await?;
    debug!("Inserted {} words", inserted.len());

    Ok(inserted)
}

/// Apply a partial update, touching only the supplied columns
///
/// Returns `None` when no record has this id.
pub async fn update_word(
    pool: &SqlitePool,
    id: &str,
    changes: &WordChanges,
) -> Result<Option<WordRecord>> {
    if changes.is_empty() {
        return get_word(pool, id).await;
    }

    let row = sqlx::query(&format!(
        r#"
        UPDATE words SET
            text = COALESCE(?, text),
            translation = COALESCE(?, translation),
            detail = COALESCE(?, detail)
        WHERE id = ?
        RETURNING {}
        "#,
        WORD_COLUMNS
    ))
    .bind(&changes.text)
    .bind(&changes.translation)
    .bind(&changes.detail)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_word).transpose()
}

/// Record one review outcome and reschedule the word
///
/// The transaction opens with a write so it holds the write lock before
/// reading the current stage. A deferred transaction that reads first cannot
/// upgrade once another connection has committed, and SQLite fails it with
/// `SQLITE_BUSY` instead of waiting.
pub async fn record_review(
    pool: &SqlitePool,
    id: &str,
    outcome: ReviewOutcome,
    today: NaiveDate,
) -> Result<Option<WordRecord>> {
    let mut tx = pool.begin().await?;

    let claimed = sqlx::query("UPDATE words SET stage = stage WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if claimed.rows_affected() == 0 {
        return Ok(None);
    }

    let row = sqlx::query(&format!("SELECT {} FROM words WHERE id = ?", WORD_COLUMNS))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    let mut word = row_to_word(&row)?;

    let schedule = apply_review(word.stage, outcome, today);

    sqlx::query("UPDATE words SET stage = ?, next_review_date = ? WHERE id = ?")
        .bind(i64::from(schedule.stage))
        .bind(schedule.next_review_date)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    word.stage = schedule.stage;
    word.next_review_date = schedule.next_review_date;
    Ok(Some(word))
}

/// Delete one record; returns whether a row existed
pub async fn delete_word(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM words WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Words due on or before `today`, earliest due first
pub async fn due_words(pool: &SqlitePool, today: NaiveDate) -> Result<Vec<WordRecord>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {} FROM words
        WHERE next_review_date <= ?
        ORDER BY next_review_date ASC, created_at ASC, rowid ASC
        "#,
        WORD_COLUMNS
    ))
    .bind(today)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_word).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use chrono::Days;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn force_due(pool: &SqlitePool, id: &str, due: NaiveDate) {
        sqlx::query("UPDATE words SET next_review_date = ? WHERE id = ?")
            .bind(due)
            .bind(id)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insert_and_fetch_round_trip() {
        let pool = test_pool().await;
        let today = date(2024, 1, 1);

        let inserted = insert_words(&pool, &[WordItem::new("ephemeral", "短暂的")], today)
            .await
            .unwrap();
        assert_eq!(inserted.len(), 1);

        let fetched = get_word(&pool, &inserted[0].id).await.unwrap().unwrap();
        assert_eq!(fetched.text, "ephemeral");
        assert_eq!(fetched.translation, "短暂的");
        assert_eq!(fetched.stage, Stage::NEW);
        assert_eq!(fetched.next_review_date, today);
        assert_eq!(fetched.detail, "");
        assert_eq!(fetched, inserted[0]);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let pool = test_pool().await;
        let today = date(2024, 1, 1);

        insert_words(&pool, &[WordItem::new("first", "一")], today).await.unwrap();
        insert_words(&pool, &[WordItem::new("second", "二")], today).await.unwrap();
        insert_words(&pool, &[WordItem::new("third", "三")], today).await.unwrap();

        let texts: Vec<String> = list_words(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.text)
            .collect();
        assert_eq!(texts, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_review_known_and_forgot() {
        let pool = test_pool().await;
        let today = date(2024, 1, 1);
        let id = insert_words(&pool, &[WordItem::new("lucid", "清晰的")], today)
            .await
            .unwrap()
            .remove(0)
            .id;

        let after_known = record_review(&pool, &id, ReviewOutcome::Known, today)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after_known.stage.value(), 1);
        assert_eq!(after_known.next_review_date, date(2024, 1, 2));

        let stored = get_word(&pool, &id).await.unwrap().unwrap();
        assert_eq!(stored, after_known);

        let after_forgot = record_review(&pool, &id, ReviewOutcome::Forgot, today)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after_forgot.stage, Stage::NEW);
        assert_eq!(after_forgot.next_review_date, today);
    }

    #[tokio::test]
    async fn test_review_unknown_id() {
        let pool = test_pool().await;
        let result = record_review(&pool, "missing", ReviewOutcome::Known, date(2024, 1, 1))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_due_words_excludes_tomorrow_and_sorts() {
        let pool = test_pool().await;
        let today = date(2024, 1, 10);
        let words = insert_words(
            &pool,
            &[
                WordItem::new("today", "今天"),
                WordItem::new("overdue", "逾期"),
                WordItem::new("tomorrow", "明天"),
            ],
            today,
        )
        .await
        .unwrap();

        force_due(&pool, &words[1].id, today - Days::new(3)).await;
        force_due(&pool, &words[2].id, today + Days::new(1)).await;

        let due = due_words(&pool, today).await.unwrap();
        let texts: Vec<&str> = due.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["overdue", "today"]);

        // Idempotent without intervening reviews
        let again = due_words(&pool, today).await.unwrap();
        assert_eq!(due, again);
    }

    #[tokio::test]
    async fn test_update_touches_only_supplied_columns() {
        let pool = test_pool().await;
        let word = insert_words(&pool, &[WordItem::new("candid", "坦率的")], date(2024, 1, 1))
            .await
            .unwrap()
            .remove(0);

        let changes = WordChanges {
            detail: Some(r#"{"tip":"candid camera"}"#.to_string()),
            ..Default::default()
        };
        let updated = update_word(&pool, &word.id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.text, "candid");
        assert_eq!(updated.translation, "坦率的");
        assert_eq!(updated.detail, r#"{"tip":"candid camera"}"#);
        assert_eq!(updated.stage, word.stage);

        let unchanged = update_word(&pool, &word.id, &WordChanges::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged, updated);

        assert!(update_word(&pool, "missing", &changes).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_word() {
        let pool = test_pool().await;
        let word = insert_words(&pool, &[WordItem::new("moot", "有争议的")], date(2024, 1, 1))
            .await
            .unwrap()
            .remove(0);

        assert!(delete_word(&pool, &word.id).await.unwrap());
        assert!(!delete_word(&pool, &word.id).await.unwrap());
        assert!(get_word(&pool, &word.id).await.unwrap().is_none());
    }
}
