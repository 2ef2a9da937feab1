//! Spaced-repetition scheduling
//!
//! A word's mastery is a stage in `0..=6`. Each stage indexes a fixed table of
//! review intervals (in days). A "known" outcome advances the stage by one,
//! saturating at the top of the table; a "forgot" outcome resets it to zero.
//!
//! | Stage | Interval (days) |
//! |-------|-----------------|
//! | 0     | 0               |
//! | 1     | 1               |
//! | 2     | 2               |
//! | 3     | 4               |
//! | 4     | 7               |
//! | 5     | 15              |
//! | 6     | 30              |

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Review interval in days, indexed by stage
pub const REVIEW_INTERVALS: [u64; 7] = [0, 1, 2, 4, 7, 15, 30];

/// Mastery stage of a word, always within `0..=Stage::MAX`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Stage(u8);

impl Stage {
    /// Highest stage (last entry of the interval table)
    pub const MAX: u8 = (REVIEW_INTERVALS.len() - 1) as u8;

    /// Stage of a freshly imported word
    pub const NEW: Stage = Stage(0);

    /// Create a stage, returning `None` when out of range
    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    /// Create a stage, forcing out-of-range values to the nearest bound
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, Self::MAX as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Review interval for this stage
    pub fn interval_days(self) -> u64 {
        REVIEW_INTERVALS[self.0 as usize]
    }

    /// Next stage after a successful recall (saturating)
    pub fn advance(self) -> Self {
        Self(self.0.saturating_add(1).min(Self::MAX))
    }

    pub fn is_mastered(self) -> bool {
        self.0 == Self::MAX
    }
}

impl TryFrom<i64> for Stage {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        u8::try_from(value)
            .ok()
            .and_then(Stage::new)
            .ok_or_else(|| {
                Error::InvalidInput(format!("stage {} outside 0..={}", value, Stage::MAX))
            })
    }
}

impl From<Stage> for i64 {
    fn from(stage: Stage) -> Self {
        stage.0 as i64
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Learner's verdict for one review of one word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Recalled correctly ("Got it")
    Known,
    /// Not recalled ("Forgot")
    Forgot,
}

impl From<bool> for ReviewOutcome {
    fn from(known: bool) -> Self {
        if known {
            ReviewOutcome::Known
        } else {
            ReviewOutcome::Forgot
        }
    }
}

/// New scheduling state produced by a review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewSchedule {
    pub stage: Stage,
    pub next_review_date: NaiveDate,
}

/// Apply one review outcome to a word's current stage
///
/// `today` is the current calendar date in the reference zone. The returned
/// date is `today` plus the interval of the new stage. Pure; the caller
/// persists the result.
pub fn apply_review(stage: Stage, outcome: ReviewOutcome, today: NaiveDate) -> ReviewSchedule {
    let stage = match outcome {
        ReviewOutcome::Known => stage.advance(),
        ReviewOutcome::Forgot => Stage::NEW,
    };

    // Interval table tops out at 30 days, far inside NaiveDate's range
    let next_review_date = today
        .checked_add_days(Days::new(stage.interval_days()))
        .unwrap_or(NaiveDate::MAX);

    ReviewSchedule {
        stage,
        next_review_date,
    }
}
