//! Error types for ledger operations.

use a2a_canonical::{TxRef, ValidationError};
use thiserror::Error;

/// Errors that can occur while anchoring to or reading from a ledger.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The ledger definitively declined the transaction.
    #[error("submission rejected: {code}: {message}")]
    SubmissionRejected {
        /// Ledger result code (e.g. `tecUNFUNDED_PAYMENT`).
        code: String,
        /// Human-readable explanation from the ledger.
        message: String,
    },
    /// Inclusion was not confirmed before the deadline. The transaction may
    /// be resubmitted with a fresh sequence number.
    #[error("transaction not confirmed: {0}")]
    NotConfirmed(String),
    /// No transaction exists under the reference.
    #[error("transaction not found: {0}")]
    TransactionNotFound(TxRef),
    /// The transaction carries an attachment that is not a commitment payload.
    #[error("cannot decode commitment payload: {0}")]
    Decode(String),
    /// The ledger node could not be reached or timed out.
    #[error("ledger node unavailable: {0}")]
    Unavailable(String),
    /// The node answered with something the adapter does not understand.
    #[error("unexpected ledger response: {0}")]
    Protocol(String),
    /// Missing endpoint or credentials.
    #[error("invalid ledger configuration: {0}")]
    InvalidConfiguration(String),
}

impl LedgerError {
    /// True for failures the caller may retry (by resubmitting or calling
    /// again later).
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::NotConfirmed(_) | LedgerError::Unavailable(_))
    }

    /// Ledger result code, when the ledger reported one.
    pub fn code(&self) -> Option<&str> {
        match self {
            LedgerError::SubmissionRejected { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Protocol(err.to_string())
    }
}
