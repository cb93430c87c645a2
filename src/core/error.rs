//! Failure types for resolving a single item.

use thiserror::Error;

/// The catalogue could not provide a usable document for an item.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to reach the catalogue for item {id}: {message}")]
    Unreachable { id: u32, message: String },
    #[error("Received empty response for item {id}")]
    Empty { id: u32 },
    #[error("Failed to parse catalogue response for item {id}")]
    Malformed {
        id: u32,
        #[source]
        source: serde_json::Error,
    },
}

/// A price string did not match the `<number>[k|m]` grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid price '{raw}': {reason}")]
pub struct FormatError {
    pub raw: String,
    pub reason: &'static str,
}

impl FormatError {
    pub(crate) fn new(raw: &str, reason: &'static str) -> Self {
        Self {
            raw: raw.to_string(),
            reason,
        }
    }
}

#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Format(#[from] FormatError),
}
