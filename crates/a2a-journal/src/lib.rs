//! Append-only journal of anchor receipts and verification reports.
//!
//! This crate provides:
//! - Framed, append-only storage for receipt and report JSON
//! - Reader/writer APIs with strict and permissive modes
//! - Typed [`JournalEntry`] decoding, skipping frame kinds it does not know
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use a2a_journal::{JournalEntry, JournalReader, JournalWriter, ReadMode, WriteOptions};
//! # fn receipt() -> a2a_ledger::AnchorReceipt { unimplemented!() }
//!
//! let mut writer = JournalWriter::open("anchors.a2aj", WriteOptions::default())?;
//! writer.append_receipt(&receipt())?;
//! writer.finish()?;
//!
//! let mut reader = JournalReader::open("anchors.a2aj", ReadMode::Strict)?;
//! while let Some(entry) = reader.read_entry()? {
//!     if let JournalEntry::Receipt(r) = entry {
//!         println!("{} -> {}", r.session_id, r.tx_ref);
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! File layout: a 16-byte header (`A2AJ`, version, flags, reserved), then
//! frames of an 8-byte header (kind, 3 reserved bytes, little-endian payload
//! length) followed by a UTF-8 JSON payload.

#![deny(missing_docs)]

/// Typed journal entries.
pub mod entry;
/// Error types for journal operations.
pub mod errors;
/// Frame structure and serialization.
pub mod frame;
/// Journal reader implementation.
pub mod reader;
/// Journal writer implementation.
pub mod writer;

pub use entry::JournalEntry;
pub use errors::JournalError;
pub use frame::{FrameKind, JournalHeader, RecordFrame};
pub use reader::{JournalReader, ReadMode};
pub use writer::{JournalWriter, WriteOptions};
