//! Commitment, anchoring and verification of A2A traces.
//!
//! This crate provides:
//! - The chunked Merkle committer over canonical trace bytes
//! - Provenance types kept outside the hashed content
//! - [`AnchorService`]: commit, store and pin, then anchor on a ledger
//! - [`Verifier`]: recompute roots from stored bytes and compare
//! - [`AnchorConfig`]: file and environment configuration
//!
//! Core invariants:
//! - The root is computed over exactly the bytes handed to the store
//! - Content is stored and pinned before its commitment reaches the ledger
//! - Verification only reads and always yields a report
//!
#![deny(missing_docs)]

/// Anchoring orchestration.
pub mod anchor;
/// Serialize-and-commit.
pub mod committer;
/// Configuration.
pub mod config;
/// Error types for anchoring.
pub mod errors;
/// Chunked Merkle commitment.
pub mod merkle;
/// Provenance and the full trace document.
pub mod provenance;
/// Verification logic and result type.
pub mod verification;

pub use anchor::{AnchorService, AnchoredTrace, IPFS_SCHEME};
pub use committer::{CommittedTrace, Committer};
pub use config::{AnchorConfig, ConfigError};
pub use errors::{AnchorError, AnchorStage};
pub use merkle::{commit, fold, MerkleCommitment, MerkleError, DEFAULT_CHUNK_SIZE};
pub use provenance::{AnchorRef, Hashing, Provenance, TraceRecord};
pub use verification::{
    verify_bytes, VerificationResult, Verifier, NOT_VALIDATED, NO_COMMITMENT, ROOT_MISMATCH,
};
