//! Tolerant JSON extraction from free-form model output
//!
//! Models often wrap JSON in a fenced code block or surround it with prose.
//! Extraction tries two candidates in order:
//! 1. the body of the first fenced block (```` ``` ```` or ```` ```json ````)
//! 2. the widest bracket span of the expected shape (`[...]` or `{...}`)
//!
//! The first candidate that deserializes into the requested type wins.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use thiserror::Error;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("valid fenced-block regex"));

static ARRAY_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[.*\]").expect("valid array-span regex"));

static OBJECT_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid object-span regex"));

/// Top-level JSON shape expected from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Array,
    Object,
}

impl std::fmt::Display for JsonShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonShape::Array => write!(f, "array"),
            JsonShape::Object => write!(f, "object"),
        }
    }
}

/// Neither extraction stage produced usable JSON
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    /// No fenced block and no bracket span of the expected shape
    #[error("no JSON {0} found in model output")]
    NotFound(JsonShape),

    /// Candidates were found but none deserialized
    #[error("no valid JSON {shape} in model output ({candidates} candidates, last error: {reason})")]
    Invalid {
        shape: JsonShape,
        candidates: usize,
        reason: String,
    },
}

/// Candidate JSON texts in priority order
fn candidates(text: &str, shape: JsonShape) -> Vec<&str> {
    let mut found = Vec::with_capacity(2);

    if let Some(body) = FENCED_BLOCK.captures(text).and_then(|c| c.get(1)) {
        found.push(body.as_str().trim());
    }

    let span = match shape {
        JsonShape::Array => &ARRAY_SPAN,
        JsonShape::Object => &OBJECT_SPAN,
    };
    if let Some(m) = span.find(text) {
        if !found.contains(&m.as_str()) {
            found.push(m.as_str());
        }
    }

    found
}

/// Extract a value of type `T` from model output
pub fn extract_json<T: DeserializeOwned>(text: &str, shape: JsonShape) -> Result<T, ParseFailure> {
    let candidates = candidates(text, shape);
    if candidates.is_empty() {
        return Err(ParseFailure::NotFound(shape));
    }

    let mut last_error = String::new();
    for candidate in &candidates {
        match serde_json::from_str::<T>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = e.to_string(),
        }
    }

    Err(ParseFailure::Invalid {
        shape,
        candidates: candidates.len(),
        reason: last_error,
    })
}
