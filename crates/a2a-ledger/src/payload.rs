//! Commitment payload and its memo encoding.
//!
//! The payload is the compact tuple written into a transaction attachment.
//! Its bytes are RFC 8785 canonical JSON, and every memo field is carried as
//! upper-case hex so it survives the ledger's opaque blob field unchanged.

use a2a_canonical::{ContentId, HexDigest, SessionId};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Version tag written into every payload.
pub const PAYLOAD_VERSION: &str = "a2a-0.1";

/// Separator between the version tag and a recorded chunk size.
const CHUNK_SIZE_TAG: &str = "/c";

/// Memo type identifying trace commitments.
pub const MEMO_TYPE: &str = "A2A_TRACE";

/// Memo format of the payload bytes.
pub const MEMO_FORMAT: &str = "json";

/// Commitment written to the ledger.
///
/// Wire keys are short (`v`, `sid`, `cid`, `root`, `ts`, `model`) to keep
/// the attachment small.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentPayload {
    /// Payload version tag.
    pub v: String,
    /// Session the trace belongs to.
    pub sid: SessionId,
    /// Content identifier of the canonical bytes.
    pub cid: ContentId,
    /// Merkle root of the canonical bytes.
    pub root: HexDigest,
    /// Unix timestamp in seconds.
    pub ts: i64,
    /// Model tag.
    pub model: String,
}

impl CommitmentPayload {
    /// Builds a payload with the current version tag.
    pub fn new(
        content_id: ContentId,
        merkle_root: HexDigest,
        session_id: SessionId,
        model: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            v: PAYLOAD_VERSION.to_string(),
            sid: session_id,
            cid: content_id,
            root: merkle_root,
            ts: timestamp,
            model: model.into(),
        }
    }

    /// Records `chunk_size` in the version tag, as in `a2a-0.1/c1024`.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.v = format!("{}{}{}", PAYLOAD_VERSION, CHUNK_SIZE_TAG, chunk_size);
        self
    }

    /// Chunk size recorded in the version tag, if any.
    pub fn chunk_size(&self) -> Option<usize> {
        self.v
            .strip_prefix(PAYLOAD_VERSION)?
            .strip_prefix(CHUNK_SIZE_TAG)?
            .parse::<usize>()
            .ok()
            .filter(|&size| size > 0)
    }

    /// Canonical JSON bytes of the payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        let value =
            serde_json::to_value(self).map_err(|e| LedgerError::Protocol(e.to_string()))?;
        let text =
            canonical_json::to_string(&value).map_err(|e| LedgerError::Protocol(e.to_string()))?;
        Ok(text.into_bytes())
    }

    /// Parses payload bytes, re-validating every identifier.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| LedgerError::Decode(format!("payload is not UTF-8: {}", e)))?;
        let payload: CommitmentPayload = serde_json::from_str(text)
            .map_err(|e| LedgerError::Decode(format!("payload is not valid JSON: {}", e)))?;
        payload.validate()?;
        Ok(payload)
    }

    fn validate(&self) -> Result<(), LedgerError> {
        let invalid = |e: a2a_canonical::ValidationError| LedgerError::Decode(e.to_string());
        SessionId::parse(self.sid.as_str()).map_err(invalid)?;
        ContentId::parse(self.cid.as_str()).map_err(invalid)?;
        HexDigest::parse(self.root.as_str()).map_err(invalid)?;
        Ok(())
    }
}

/// One transaction memo, every field hex-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    /// Hex of the memo type.
    #[serde(rename = "MemoType", default, skip_serializing_if = "Option::is_none")]
    pub memo_type: Option<String>,
    /// Hex of the memo format.
    #[serde(rename = "MemoFormat", default, skip_serializing_if = "Option::is_none")]
    pub memo_format: Option<String>,
    /// Hex of the memo data.
    #[serde(rename = "MemoData", default, skip_serializing_if = "Option::is_none")]
    pub memo_data: Option<String>,
}

impl Memo {
    /// Memo carrying arbitrary text fields, for foreign attachments.
    pub fn text(memo_type: &str, memo_data: &[u8]) -> Self {
        Self {
            memo_type: Some(hex::encode_upper(memo_type.as_bytes())),
            memo_format: None,
            memo_data: Some(hex::encode_upper(memo_data)),
        }
    }
}

/// `{"Memo": {...}}` wrapper used in transaction JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoWrapper {
    /// The memo.
    #[serde(rename = "Memo")]
    pub memo: Memo,
}

/// Encodes a payload as a trace commitment memo.
pub fn encode_memo(payload: &CommitmentPayload) -> Result<Memo, LedgerError> {
    Ok(Memo {
        memo_type: Some(hex::encode_upper(MEMO_TYPE)),
        memo_format: Some(hex::encode_upper(MEMO_FORMAT)),
        memo_data: Some(hex::encode_upper(payload.to_bytes()?)),
    })
}

/// Decodes a trace commitment memo back to its payload.
///
/// # Errors
///
/// Returns [`LedgerError::Decode`] when the memo type is not a trace
/// commitment, or when the data is not hex, not UTF-8, or not a payload.
pub fn decode_memo(memo: &Memo) -> Result<CommitmentPayload, LedgerError> {
    let memo_type = match &memo.memo_type {
        Some(hex_type) => decode_hex_text(hex_type, "memo type")?,
        None => return Err(LedgerError::Decode("memo has no type".to_string())),
    };
    if memo_type != MEMO_TYPE {
        return Err(LedgerError::Decode(format!(
            "foreign memo type: {}",
            memo_type
        )));
    }
    let data = memo
        .memo_data
        .as_deref()
        .ok_or_else(|| LedgerError::Decode("memo has no data".to_string()))?;
    let bytes = hex::decode(data)
        .map_err(|e| LedgerError::Decode(format!("memo data is not hex: {}", e)))?;
    CommitmentPayload::from_bytes(&bytes)
}

/// Decodes the first memo of a transaction.
///
/// Returns `Ok(None)` when there are no memos.
pub fn decode_first(memos: &[Memo]) -> Result<Option<CommitmentPayload>, LedgerError> {
    match memos.first() {
        Some(memo) => decode_memo(memo).map(Some),
        None => Ok(None),
    }
}

fn decode_hex_text(value: &str, what: &str) -> Result<String, LedgerError> {
    let bytes = hex::decode(value)
        .map_err(|e| LedgerError::Decode(format!("{} is not hex: {}", what, e)))?;
    String::from_utf8(bytes)
        .map_err(|e| LedgerError::Decode(format!("{} is not UTF-8: {}", what, e)))
}
