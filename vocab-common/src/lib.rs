//! # Vocab Common Library
//!
//! Shared code for the vocabulary service including:
//! - Spaced-repetition scheduling (stage and interval table)
//! - Reference time zone and calendar helpers
//! - Database initialization and schema
//! - Configuration file loading and data folder resolution
//! - SSE utilities for streamed text fragments

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod sse;
pub mod srs;
pub mod time;

pub use error::{Error, Result};
pub use srs::{apply_review, ReviewOutcome, Stage};
pub use time::ReferenceZone;
