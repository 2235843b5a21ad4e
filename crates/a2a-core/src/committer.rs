//! Serialize-then-commit in one step.

use a2a_canonical::{CanonicalBytes, CanonicalizationError, Canonicalizer, TraceContent};
use std::num::NonZeroUsize;

use crate::merkle::{commit_with, MerkleCommitment, MerkleError, DEFAULT_CHUNK_SIZE};
use crate::provenance::{Hashing, TraceRecord};

/// Content committed and ready for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedTrace {
    /// Full record with `hashing` filled in.
    pub record: TraceRecord,
    /// Exact bytes the root was computed over.
    pub bytes: CanonicalBytes,
}

/// Commits trace content with a fixed, validated chunk size.
#[derive(Debug, Clone)]
pub struct Committer {
    chunk_size: NonZeroUsize,
    canonicalizer: Canonicalizer,
}

impl Default for Committer {
    fn default() -> Self {
        Self {
            chunk_size: NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroUsize::MIN),
            canonicalizer: Canonicalizer::new(),
        }
    }
}

impl Committer {
    /// Creates a committer.
    ///
    /// # Errors
    ///
    /// Returns [`MerkleError::InvalidChunkSize`] when `chunk_size` is zero.
    pub fn new(chunk_size: usize) -> Result<Self, MerkleError> {
        let chunk_size =
            NonZeroUsize::new(chunk_size).ok_or(MerkleError::InvalidChunkSize(chunk_size))?;
        Ok(Self {
            chunk_size,
            canonicalizer: Canonicalizer::new(),
        })
    }

    /// Chunk size in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size.get()
    }

    /// The canonicalizer used for content.
    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    /// Commits raw bytes.
    pub fn commit_bytes(&self, bytes: &[u8]) -> MerkleCommitment {
        commit_with(bytes, self.chunk_size)
    }

    /// Serializes `content` canonically and commits the bytes.
    pub fn commit(&self, content: &TraceContent) -> Result<CommittedTrace, CanonicalizationError> {
        let bytes = self.canonicalizer.serialize(content)?;
        let commitment = self.commit_bytes(bytes.as_bytes());
        tracing::debug!(
            session_id = %content.session.id,
            size = bytes.len(),
            chunks = commitment.leaf_count(),
            root = %commitment.root,
            "committed trace"
        );
        Ok(CommittedTrace {
            record: TraceRecord::new(content.clone(), Hashing::from(commitment)),
            bytes,
        })
    }
}
