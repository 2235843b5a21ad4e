//! Canonical data model primitives for A2A trace anchoring.
//!
//! A trace is split into two parts. [`TraceContent`] holds the
//! content-bearing fields (session, model, events, usage) and is the only
//! input to hashing. Everything that describes a commitment (root, chunk
//! hashes, store and ledger references) lives outside this crate and never
//! participates in the canonical bytes.
//!
#![deny(missing_docs)]

/// Event collector for building traces.
pub mod builder;
/// Byte-exact canonical serialization.
pub mod canonicalizer;
/// Digest primitives.
pub mod digest;
/// Identifier newtypes.
pub mod identifiers;
/// Trace content types.
pub mod record;
/// Validation helpers used by canonical types.
pub mod validation;

pub use builder::{TextEvent, TraceBuilder};
pub use canonicalizer::{CanonicalBytes, CanonicalizationError, Canonicalizer};
pub use digest::{sha256_hex, DigestAlg, HexDigest};
pub use identifiers::{ContentId, SessionId, Timestamp, TxRef};
pub use record::{
    Event, ModelInfo, Redactions, Session, Signature, TraceContent, Usage, TRACE_VERSION,
};
pub use validation::ValidationError;
