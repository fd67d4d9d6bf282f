//! Quote record model

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{Error, Result};

/// A stable quote identifier.
///
/// Locally created quotes get a UUID v7 (time-sortable); quotes pulled from the
/// remote collection carry the server's numeric id rendered as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(String);

impl QuoteId {
    /// Create a new unique local quote ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for QuoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for QuoteId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for QuoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for QuoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Where a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Entered or imported on this device
    #[default]
    Local,
    /// Pulled from the remote collection
    Remote,
}

/// A quote in the collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    /// Identifier, absent for legacy records that are matched by text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<QuoteId>,
    /// The quotable content
    pub text: String,
    /// Free-form classification tag
    pub category: String,
    /// Last modification timestamp (Unix ms)
    #[serde(default)]
    pub updated_at: i64,
    /// Provenance, kept for diagnostics only
    #[serde(default)]
    pub origin: Origin,
}

impl QuoteRecord {
    /// Create a new local quote with a fresh id.
    ///
    /// Does not validate; use [`validate_quote_fields`] on user input first.
    #[must_use]
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: Some(QuoteId::new()),
            text: text.into(),
            category: category.into(),
            updated_at: chrono::Utc::now().timestamp_millis(),
            origin: Origin::Local,
        }
    }

    /// Create a record as seen on the remote side
    #[must_use]
    pub fn remote(
        id: impl Into<QuoteId>,
        text: impl Into<String>,
        category: impl Into<String>,
        updated_at: i64,
    ) -> Self {
        Self {
            id: Some(id.into()),
            text: text.into(),
            category: category.into(),
            updated_at,
            origin: Origin::Remote,
        }
    }

    /// Whether two records refer to the same quote.
    ///
    /// Ids are compared when both sides carry one; otherwise the exact text is.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        match (&self.id, &other.id) {
            (Some(left), Some(right)) => left == right,
            _ => self.text == other.text,
        }
    }

    /// Case-insensitive category comparison used by filters
    #[must_use]
    pub fn in_category(&self, category: &str) -> bool {
        self.category.eq_ignore_ascii_case(category.trim())
    }
}

/// Trim and check quote text and category.
///
/// Returns the trimmed pair, or [`Error::Validation`] when either is empty.
pub fn validate_quote_fields(text: &str, category: &str) -> Result<(String, String)> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::Validation("quote text cannot be empty".into()));
    }
    let category = category.trim();
    if category.is_empty() {
        return Err(Error::Validation("quote category cannot be empty".into()));
    }
    Ok((text.to_string(), category.to_string()))
}

/// The built-in collection used when nothing has been stored yet
#[must_use]
pub fn default_quotes() -> Vec<QuoteRecord> {
    [
        (
            "The only limit to our realization of tomorrow is our doubts of today.",
            "Motivation",
        ),
        (
            "Life is what happens when you're busy making other plans.",
            "Life",
        ),
        (
            "Success is not final, failure is not fatal: It is the courage to continue that counts.",
            "Success",
        ),
    ]
    .into_iter()
    .map(|(text, category)| QuoteRecord::new(text, category))
    .collect()
}
