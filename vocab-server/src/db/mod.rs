//! Database access for vocab-server
//!
//! Schema creation lives in `vocab_common::db`; this module holds the word
//! queries used by the HTTP handlers.

pub mod words;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;

pub use words::{
    delete_word, due_words, get_word, insert_words, list_words, record_review, update_word,
};

/// Open the on-disk word store and bring the schema up to date
pub async fn init_database_pool(db_path: &Path) -> vocab_common::Result<SqlitePool> {
    vocab_common::db::init_database(db_path).await
}

/// In-memory store with the full schema
///
/// Limited to one connection: every SQLite `:memory:` connection is a
/// separate database.
pub async fn connect_in_memory() -> vocab_common::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    vocab_common::db::init_schema(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    connect_in_memory().await.expect("in-memory database")
}
