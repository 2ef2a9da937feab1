//! Word records and AI payload types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use vocab_common::Stage;

/// A persisted vocabulary entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordRecord {
    pub id: String,
    pub text: String,
    pub translation: String,
    pub stage: Stage,
    /// Calendar date (reference zone) on which the word is due again
    pub next_review_date: NaiveDate,
    /// Cached association payload, empty until first lookup
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

impl WordRecord {
    pub fn has_detail(&self) -> bool {
        !self.detail.trim().is_empty()
    }
}

/// A vocabulary term with its gloss
///
/// Used both for import requests and for AI extraction / association results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordItem {
    pub text: String,
    pub translation: String,
}

impl WordItem {
    pub fn new(text: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            translation: translation.into(),
        }
    }

    /// Trimmed copy, or `None` if either field is blank
    pub fn normalized(&self) -> Option<Self> {
        let text = self.text.trim();
        let translation = self.translation.trim();
        if text.is_empty() || translation.is_empty() {
            return None;
        }
        Some(Self::new(text, translation))
    }
}

/// Column-wise partial update of a word record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordChanges {
    pub text: Option<String>,
    pub translation: Option<String>,
    pub detail: Option<String>,
}

impl WordChanges {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.translation.is_none() && self.detail.is_none()
    }
}

/// Structured memory aids for one word
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Association {
    /// One-line root / origin note
    pub etymology: String,
    /// One-line mnemonic tip
    pub tip: String,
    pub synonyms: Vec<WordItem>,
    /// Words sharing the same root
    pub derivatives: Vec<WordItem>,
    /// Look-alike words that are easy to confuse
    pub similar: Vec<WordItem>,
}
