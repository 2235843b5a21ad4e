//! Receipts returned by successful anchoring.

use a2a_canonical::{ContentId, HexDigest, SessionId, TxRef};
use serde::{Deserialize, Serialize};

/// Proof that a commitment was included in a validated ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorReceipt {
    /// Content identifier of the anchored bytes.
    pub content_id: ContentId,
    /// Merkle root of the anchored bytes.
    pub merkle_root: HexDigest,
    /// Session id.
    pub session_id: SessionId,
    /// Unix timestamp written into the payload.
    pub timestamp: i64,
    /// Model tag.
    pub model: String,
    /// Transaction reference.
    pub tx_ref: TxRef,
    /// Index of the validated ledger holding the transaction.
    pub ledger_index: u64,
    /// Network tag (e.g. `testnet`).
    pub network: String,
}

/// Where a submitted transaction landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerInclusion {
    /// Transaction reference.
    pub tx_ref: TxRef,
    /// Index of the validated ledger.
    pub ledger_index: u64,
}
