//! Journal writer implementation.

use a2a_core::VerificationResult;
use a2a_ledger::AnchorReceipt;
use serde::Serialize;

use crate::entry::{to_payload, JournalEntry};
use crate::errors::JournalError;
use crate::frame::{FrameKind, JournalHeader, RecordFrame, HEADER_SIZE};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::Path;

/// Options for journal writing.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Whether to fsync after each append (default: false).
    pub sync: bool,
    /// Whether to create the file if it doesn't exist (default: true).
    pub create: bool,
    /// Keep existing frames (default: true); otherwise the file is reset to
    /// its header.
    pub append: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            sync: false,
            create: true,
            append: true,
        }
    }
}

/// Appends receipts and verification reports to a journal file.
///
/// Each append writes one frame and flushes it; nothing already written is
/// ever rewritten.
pub struct JournalWriter {
    file: File,
    sync: bool,
}

impl JournalWriter {
    /// Opens or creates a journal for appending.
    ///
    /// An empty file gets a fresh header. A non-empty file must start with a
    /// valid header.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError`] if the file cannot be opened, holds fewer
    /// bytes than a header, or is not a journal.
    pub fn open<P: AsRef<Path>>(path: P, options: WriteOptions) -> Result<Self, JournalError> {
        let mut file = OpenOptions::new()
            .create(options.create)
            .read(true)
            .write(true)
            .open(path)?;

        let len = file.metadata()?.len();
        if len == 0 {
            file.write_all(&JournalHeader::new().to_bytes())?;
        } else if len < HEADER_SIZE as u64 {
            return Err(JournalError::FileNotEmpty);
        } else {
            let mut header = [0u8; HEADER_SIZE];
            file.seek(io::SeekFrom::Start(0))?;
            file.read_exact(&mut header)?;
            JournalHeader::from_bytes(&header)?;
            if !options.append {
                file.set_len(HEADER_SIZE as u64)?;
            }
            file.seek(io::SeekFrom::End(0))?;
        }

        let mut writer = Self {
            file,
            sync: options.sync,
        };
        writer.flush()?;
        Ok(writer)
    }

    /// Appends an anchor receipt.
    pub fn append_receipt(&mut self, receipt: &AnchorReceipt) -> Result<(), JournalError> {
        self.append(FrameKind::Receipt, receipt)
    }

    /// Appends a verification report.
    pub fn append_verification(&mut self, result: &VerificationResult) -> Result<(), JournalError> {
        self.append(FrameKind::Verification, result)
    }

    /// Appends a typed entry.
    pub fn append_entry(&mut self, entry: &JournalEntry) -> Result<(), JournalError> {
        let payload = entry.to_payload()?;
        self.append_raw(entry.kind(), &payload)
    }

    /// Appends any serializable value as JSON under `kind`.
    pub fn append<T: Serialize + ?Sized>(
        &mut self,
        kind: FrameKind,
        value: &T,
    ) -> Result<(), JournalError> {
        let payload = to_payload(value)?;
        self.append_raw(kind, &payload)
    }

    /// Appends a raw frame with the given kind and payload.
    pub fn append_raw(&mut self, kind: FrameKind, payload: &[u8]) -> Result<(), JournalError> {
        let frame = RecordFrame::new(kind, payload.len())?;
        self.file.write_all(&frame.to_bytes())?;
        self.file.write_all(payload)?;
        self.flush()
    }

    /// Flushes and closes the journal.
    pub fn finish(mut self) -> Result<(), JournalError> {
        self.flush()
    }

    fn flush(&mut self) -> Result<(), JournalError> {
        self.file.flush()?;
        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }
}
