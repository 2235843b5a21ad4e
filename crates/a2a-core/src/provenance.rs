//! Commitment metadata kept alongside, never inside, the hashed content.

use a2a_canonical::{ContentId, DigestAlg, HexDigest, Redactions, Signature, TraceContent, TxRef};
use serde::{Deserialize, Serialize};

use crate::merkle::MerkleCommitment;

/// `hashing` block of a trace document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hashing {
    /// Hash algorithm.
    pub algorithm: DigestAlg,
    /// Chunk size in bytes.
    pub chunk_size: usize,
    /// Merkle root over the canonical content bytes.
    #[serde(rename = "chunkMerkleRoot")]
    pub root: HexDigest,
    /// Leaf hashes.
    pub chunks: Vec<HexDigest>,
}

impl From<MerkleCommitment> for Hashing {
    fn from(commitment: MerkleCommitment) -> Self {
        Self {
            algorithm: DigestAlg::Sha256,
            chunk_size: commitment.chunk_size,
            root: commitment.root,
            chunks: commitment.leaves,
        }
    }
}

/// Ledger location of an anchored commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRef {
    /// Transaction reference.
    pub tx_ref: TxRef,
    /// Validated ledger index.
    pub ledger_index: u64,
    /// Network tag.
    pub network: String,
}

/// Everything known about a trace beyond its content: commitment, store
/// location and ledger anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Commitment over the canonical bytes.
    pub hashing: Hashing,
    /// Store identifier of the canonical bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<ContentId>,
    /// Ledger anchor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<AnchorRef>,
}

impl Provenance {
    /// Provenance of a committed but not yet stored trace.
    pub fn committed(hashing: Hashing) -> Self {
        Self {
            hashing,
            content_id: None,
            anchor: None,
        }
    }
}

/// Full `a2a-0.1` trace document: content plus envelope.
///
/// Only `content` is hashed. A record is produced by committing content, so
/// `hashing` always describes the content it travels with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Hashed content.
    #[serde(flatten)]
    pub content: TraceContent,
    /// Commitment over the canonical content bytes.
    pub hashing: Hashing,
    /// Actor signatures.
    #[serde(default)]
    pub signatures: Vec<Signature>,
    /// Redaction policy.
    #[serde(default)]
    pub redactions: Redactions,
}

impl TraceRecord {
    /// Wraps committed content with an empty envelope.
    pub fn new(content: TraceContent, hashing: Hashing) -> Self {
        Self {
            content,
            hashing,
            signatures: Vec::new(),
            redactions: Redactions::default(),
        }
    }

    /// Pretty JSON of the whole document (not the hashed form).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parses a full trace document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
