use a2a_core::VerificationResult;
use a2a_ledger::AnchorReceipt;
use serde::Serialize;

use crate::errors::JournalError;
use crate::frame::FrameKind;

/// Decoded journal entry.
#[derive(Debug, Clone, PartialEq)]
pub enum JournalEntry {
    /// Receipt of a completed anchoring.
    Receipt(AnchorReceipt),
    /// Report of one verification.
    Verification(VerificationResult),
}

impl JournalEntry {
    /// Frame kind this entry is stored under.
    pub fn kind(&self) -> FrameKind {
        match self {
            JournalEntry::Receipt(_) => FrameKind::Receipt,
            JournalEntry::Verification(_) => FrameKind::Verification,
        }
    }

    /// JSON payload bytes.
    pub fn to_payload(&self) -> Result<Vec<u8>, JournalError> {
        match self {
            JournalEntry::Receipt(receipt) => to_payload(receipt),
            JournalEntry::Verification(result) => to_payload(result),
        }
    }

    /// Decodes a payload of a known kind. Unknown kinds yield `None`.
    pub fn decode(kind: FrameKind, payload: &[u8]) -> Result<Option<Self>, JournalError> {
        let text = std::str::from_utf8(payload)?;
        let entry = match kind {
            FrameKind::Receipt => JournalEntry::Receipt(serde_json::from_str(text)?),
            FrameKind::Verification => JournalEntry::Verification(serde_json::from_str(text)?),
            FrameKind::Unknown(_) => return Ok(None),
        };
        Ok(Some(entry))
    }
}

pub(crate) fn to_payload<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, JournalError> {
    Ok(serde_json::to_vec(value)?)
}
