//! Ledger anchoring for A2A trace commitments.
//!
//! A commitment payload (session id, content id, Merkle root, timestamp,
//! model) is written into a ledger transaction attachment and read back for
//! verification. [`Ledger`] abstracts the ledger; [`XrplLedger`] signs
//! transactions locally and talks to an XRP Ledger node over JSON-RPC, and
//! [`MemoryLedger`] keeps transactions in process.

#![deny(missing_docs)]

/// XRPL binary transaction encoding.
pub mod codec;
/// Error types for ledger operations.
pub mod error;
/// XRPL seeds, key pairs and addresses.
pub mod keys;
/// In-memory ledger.
pub mod memory;
/// Commitment payload and memo codec.
pub mod payload;
/// Anchor receipts.
pub mod receipt;
/// Ledger trait.
pub mod traits;
/// XRP Ledger JSON-RPC adapter.
pub mod xrpl;

pub use codec::{AnchorTransaction, SignedTransaction};
pub use error::LedgerError;
pub use keys::{decode_address, encode_address, KeyType, Keypair};
pub use memory::MemoryLedger;
pub use payload::{
    decode_first, decode_memo, encode_memo, CommitmentPayload, Memo, MemoWrapper, MEMO_FORMAT,
    MEMO_TYPE, PAYLOAD_VERSION,
};
pub use receipt::{AnchorReceipt, LedgerInclusion};
pub use traits::{AnchoredPayload, Ledger};
pub use xrpl::{
    AccountStatus, ServerStatus, XrplConfig, XrplLedger, LAST_LEDGER_OFFSET, MAX_FEE_DROPS,
};
