//! Error types for store operations.

use a2a_canonical::{ContentId, ValidationError};
use thiserror::Error;

/// Errors that can occur during store operations.
///
/// `Unavailable` is the retryable class: the caller may repeat the call once
/// the backing store is reachable again. Nothing is retried internally.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No content is stored under the identifier.
    #[error("content not found: {0}")]
    NotFound(ContentId),
    /// The backing store could not be reached or timed out.
    #[error("content store unavailable: {0}")]
    Unavailable(String),
    /// The store answered with something the adapter does not understand.
    #[error("unexpected store response: {0}")]
    Protocol(String),
    /// An identifier (returned content id, session file name) failed validation.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] ValidationError),
    /// I/O error in a file-backed store or archive.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// True for failures the caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
