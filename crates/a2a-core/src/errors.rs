use a2a_canonical::{CanonicalizationError, ContentId};
use a2a_ledger::LedgerError;
use a2a_store::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::merkle::MerkleError;

/// Step of the anchoring flow that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorStage {
    /// Canonical serialization of the content.
    Serialization,
    /// Merkle commitment.
    Commitment,
    /// Content store upload or pin.
    Store,
    /// Ledger submission or confirmation.
    Ledger,
}

impl AnchorStage {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorStage::Serialization => "serialization",
            AnchorStage::Commitment => "commitment",
            AnchorStage::Store => "store",
            AnchorStage::Ledger => "ledger",
        }
    }
}

impl fmt::Display for AnchorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anchoring error types.
#[derive(Error, Debug)]
pub enum AnchorError {
    /// Content could not be serialized canonically. Nothing was stored.
    #[error("serialization failed: {0}")]
    Serialization(#[from] CanonicalizationError),
    /// Commitment parameters were invalid. Nothing was stored.
    #[error("commitment failed: {0}")]
    Commitment(#[from] MerkleError),
    /// Upload or pin failed. Nothing was anchored.
    #[error("content store failed: {0}")]
    Store(#[from] StoreError),
    /// Ledger anchoring failed after the content was stored and pinned.
    #[error("ledger anchoring failed: {source} (content {orphaned} stays stored)")]
    Ledger {
        /// Ledger failure.
        #[source]
        source: LedgerError,
        /// Content id stored before the failure; left pinned.
        orphaned: ContentId,
    },
}

impl AnchorError {
    /// Stage that failed.
    pub fn stage(&self) -> AnchorStage {
        match self {
            AnchorError::Serialization(_) => AnchorStage::Serialization,
            AnchorError::Commitment(_) => AnchorStage::Commitment,
            AnchorError::Store(_) => AnchorStage::Store,
            AnchorError::Ledger { .. } => AnchorStage::Ledger,
        }
    }

    /// True when the caller may retry the failed stage.
    pub fn is_retryable(&self) -> bool {
        match self {
            AnchorError::Store(e) => e.is_retryable(),
            AnchorError::Ledger { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Content left stored by a failed anchoring.
    pub fn orphaned(&self) -> Option<&ContentId> {
        match self {
            AnchorError::Ledger { orphaned, .. } => Some(orphaned),
            _ => None,
        }
    }
}
