//! Read-only verification of anchored traces.
//!
//! Every entry point returns a [`VerificationResult`]; downstream failures
//! (ledger read, store fetch, decoding) become an unverified result with an
//! error message instead of an `Err`, so each check leaves a report.

use a2a_canonical::{ContentId, HexDigest, SessionId, TxRef};
use a2a_ledger::{AnchoredPayload, Ledger};
use a2a_store::ContentStore;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::committer::Committer;
use crate::merkle::MerkleCommitment;

/// Error text when a transaction carries no commitment.
pub const NO_COMMITMENT: &str = "no commitment attached to transaction";

/// Error text when the transaction is not in a validated ledger.
pub const NOT_VALIDATED: &str = "transaction not validated";

/// Error text when the recomputed root differs from the expected one.
pub const ROOT_MISMATCH: &str = "merkle root mismatch";

/// Report of one verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// True when the recomputed root equals the expected root.
    pub verified: bool,
    /// Transaction checked, if any.
    pub tx_ref: Option<TxRef>,
    /// Session of the trace.
    pub session_id: Option<SessionId>,
    /// Content checked.
    pub content_id: Option<ContentId>,
    /// Root the content is expected to have.
    pub expected_root: Option<String>,
    /// Root recomputed from the fetched bytes.
    pub computed_root: Option<HexDigest>,
    /// Extra facts gathered along the way.
    pub details: BTreeMap<String, Value>,
    /// Why verification did not succeed.
    pub error: Option<String>,
}

impl VerificationResult {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            verified: false,
            tx_ref: None,
            session_id: None,
            content_id: None,
            expected_root: None,
            computed_root: None,
            details: BTreeMap::new(),
            error: Some(error.into()),
        }
    }

    /// `Some(expected == computed)` when both roots are known.
    pub fn root_match(&self) -> Option<bool> {
        match (&self.expected_root, &self.computed_root) {
            (Some(expected), Some(computed)) => Some(expected == computed.as_str()),
            _ => None,
        }
    }

    /// Flat mapping for display and persistence.
    pub fn to_record(&self) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("verified".into(), json!(self.verified));
        record.insert("tx_ref".into(), json!(self.tx_ref));
        record.insert("session_id".into(), json!(self.session_id));
        record.insert("content_id".into(), json!(self.content_id));
        record.insert("expected_root".into(), json!(self.expected_root));
        record.insert("computed_root".into(), json!(self.computed_root));
        record.insert("match".into(), json!(self.root_match()));
        record.insert("error".into(), json!(self.error));
        record.insert("details".into(), json!(self.details));
        record
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.verified {
            write!(f, "VERIFIED - session: ")?;
            match &self.session_id {
                Some(id) => write!(f, "{}", id)?,
                None => write!(f, "-")?,
            }
            write!(f, ", cid: ")?;
            match &self.content_id {
                Some(cid) => write!(f, "{}", cid),
                None => write!(f, "-"),
            }
        } else {
            write!(
                f,
                "VERIFICATION FAILED - {}",
                self.error.as_deref().unwrap_or(ROOT_MISMATCH)
            )
        }
    }
}

/// Checks stored traces against anchored or supplied roots.
///
/// Only reads from the store and the ledger.
#[derive(Debug)]
pub struct Verifier<S, L> {
    store: S,
    ledger: L,
    committer: Committer,
}

impl<S: ContentStore, L: Ledger> Verifier<S, L> {
    /// Creates a verifier; `committer` fixes the chunk size used to
    /// recompute roots.
    pub fn new(store: S, ledger: L, committer: Committer) -> Self {
        Self {
            store,
            ledger,
            committer,
        }
    }

    /// Verifies the trace committed by transaction `tx_ref`.
    ///
    /// Only commitments in a validated ledger can verify. A chunk size
    /// recorded in the payload version overrides the configured one.
    pub async fn verify_by_transaction(&self, tx_ref: &TxRef) -> VerificationResult {
        let anchored = match self.ledger.read(tx_ref).await {
            Ok(Some(anchored)) => anchored,
            Ok(None) => {
                let mut result = VerificationResult::failed(NO_COMMITMENT);
                result.tx_ref = Some(tx_ref.clone());
                return report(result);
            }
            Err(e) => {
                let mut result = VerificationResult::failed(format!("ledger read failed: {}", e));
                result.tx_ref = Some(tx_ref.clone());
                return report(result);
            }
        };

        let AnchoredPayload {
            payload,
            ledger_index,
        } = anchored;
        let mut result = match ledger_index {
            Some(_) => {
                let committer = match payload.chunk_size() {
                    Some(size) if size != self.committer.chunk_size() => {
                        Committer::new(size).unwrap_or_else(|_| self.committer.clone())
                    }
                    _ => self.committer.clone(),
                };
                self.check_stored(&committer, &payload.cid, payload.root.as_str())
                    .await
            }
            None => {
                let mut result = VerificationResult::failed(NOT_VALIDATED);
                result.content_id = Some(payload.cid.clone());
                result.expected_root = Some(payload.root.as_str().to_string());
                result
            }
        };
        result.tx_ref = Some(tx_ref.clone());
        result.session_id = Some(payload.sid);
        result.details.insert("model".into(), json!(payload.model));
        result.details.insert("timestamp".into(), json!(payload.ts));
        result.details.insert("version".into(), json!(payload.v));
        result.details.insert("ledger_index".into(), json!(ledger_index));
        result
            .details
            .insert("network".into(), json!(self.ledger.network()));
        report(result)
    }

    /// Verifies stored content against `expected_root`, without the ledger.
    pub async fn verify_by_content(
        &self,
        content_id: &ContentId,
        expected_root: &str,
    ) -> VerificationResult {
        let result = self
            .check_stored(&self.committer, content_id, expected_root)
            .await;
        report(result)
    }

    /// Verifies local bytes against `expected_root`, without store or ledger.
    pub fn verify_bytes(&self, bytes: &[u8], expected_root: &str) -> VerificationResult {
        verify_bytes(&self.committer, bytes, expected_root)
    }

    async fn check_stored(
        &self,
        committer: &Committer,
        content_id: &ContentId,
        expected_root: &str,
    ) -> VerificationResult {
        match self.store.get(content_id).await {
            Ok(bytes) => {
                let mut result = check_bytes(committer, &bytes, expected_root);
                result.content_id = Some(content_id.clone());
                result
            }
            Err(e) => {
                let mut result = VerificationResult::failed(format!("content fetch failed: {}", e));
                result.content_id = Some(content_id.clone());
                result.expected_root = Some(expected_root.to_string());
                result
            }
        }
    }
}

/// Verifies local bytes against `expected_root` with `committer`'s chunk
/// size. Needs neither store nor ledger.
pub fn verify_bytes(committer: &Committer, bytes: &[u8], expected_root: &str) -> VerificationResult {
    report(check_bytes(committer, bytes, expected_root))
}

fn check_bytes(committer: &Committer, bytes: &[u8], expected_root: &str) -> VerificationResult {
    let commitment = committer.commit_bytes(bytes);
    let verified = commitment.root.as_str() == expected_root;
    let mut details = commitment_details(&commitment);
    let session_id = match serde_json::from_slice::<Value>(bytes) {
        Ok(doc) => {
            if let Some(events) = doc.get("events").and_then(Value::as_array) {
                details.insert("trace_events".into(), json!(events.len()));
            }
            doc.pointer("/session/id")
                .and_then(Value::as_str)
                .and_then(|id| SessionId::parse(id).ok())
        }
        Err(_) => None,
    };
    VerificationResult {
        verified,
        tx_ref: None,
        session_id,
        content_id: None,
        expected_root: Some(expected_root.to_string()),
        computed_root: Some(commitment.root),
        details,
        error: if verified {
            None
        } else {
            Some(ROOT_MISMATCH.to_string())
        },
    }
}

fn report(result: VerificationResult) -> VerificationResult {
    if result.verified {
        tracing::info!(
            tx_ref = ?result.tx_ref.as_ref().map(TxRef::as_str),
            cid = ?result.content_id.as_ref().map(ContentId::as_str),
            "verification succeeded"
        );
    } else {
        tracing::warn!(
            tx_ref = ?result.tx_ref.as_ref().map(TxRef::as_str),
            cid = ?result.content_id.as_ref().map(ContentId::as_str),
            error = result.error.as_deref().unwrap_or_default(),
            "verification failed"
        );
    }
    result
}

fn commitment_details(commitment: &MerkleCommitment) -> BTreeMap<String, Value> {
    let mut details = BTreeMap::new();
    details.insert("chunks".to_string(), json!(commitment.leaf_count()));
    details.insert("chunk_size".to_string(), json!(commitment.chunk_size));
    details
}
