//! Content-addressed storage adapters for canonical trace bytes.
//!
//! This crate provides:
//! - The [`ContentStore`] trait (`put`/`get`/`pin`/`unpin`)
//! - [`MemoryStore`], an in-process store addressed by CIDv1
//! - [`IpfsStore`], a client for a Kubo node's HTTP RPC API
//! - [`SessionArchive`], the local one-file-per-session copy of trace bytes
//!
//! Every store round-trips bytes exactly: the Merkle root of a trace is
//! computed over the bytes handed to `put`, and verification recomputes it
//! over the bytes returned by `get`.

#![deny(missing_docs)]

/// Local session archive.
pub mod archive;
/// CIDv1 computation.
pub mod cid;
/// Error types for store operations.
pub mod error;
/// Kubo HTTP RPC store.
pub mod ipfs;
/// In-memory store.
pub mod memory;
/// Store trait.
pub mod traits;

pub use archive::{read_trace_file, SessionArchive};
pub use cid::cid_v1_raw;
pub use error::StoreError;
pub use ipfs::{IpfsConfig, IpfsStore};
pub use memory::MemoryStore;
pub use traits::ContentStore;
