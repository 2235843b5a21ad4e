//! Anchoring orchestration: commit, store, pin, then anchor.

use a2a_canonical::TraceContent;
use a2a_ledger::{AnchorReceipt, CommitmentPayload, Ledger};
use a2a_store::ContentStore;
use serde::{Deserialize, Serialize};

use crate::committer::{CommittedTrace, Committer};
use crate::errors::AnchorError;
use crate::merkle::DEFAULT_CHUNK_SIZE;
use crate::provenance::{AnchorRef, Provenance, TraceRecord};

/// URL scheme of content ids in summaries.
pub const IPFS_SCHEME: &str = "ipfs://";

/// Outcome of a successful anchoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchoredTrace {
    /// Ledger receipt.
    pub receipt: AnchorReceipt,
    /// `ipfs://<cid>` link to the stored bytes.
    pub ipfs_url: String,
    /// Number of events in the trace.
    pub event_count: usize,
    /// Committed trace document.
    pub record: TraceRecord,
    /// Commitment, store and ledger references.
    pub provenance: Provenance,
}

/// Anchors traces: canonical bytes go to the content store, the commitment
/// goes to the ledger.
///
/// Content is stored and pinned strictly before the ledger step, so any
/// anchored commitment points at retrievable bytes. When the ledger step
/// fails the stored content is left in place and reported in the error.
#[derive(Debug)]
pub struct AnchorService<S, L> {
    store: S,
    ledger: L,
    committer: Committer,
}

impl<S: ContentStore, L: Ledger> AnchorService<S, L> {
    /// Creates a service.
    pub fn new(store: S, ledger: L, committer: Committer) -> Self {
        Self {
            store,
            ledger,
            committer,
        }
    }

    /// Content store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Committer.
    pub fn committer(&self) -> &Committer {
        &self.committer
    }

    /// Anchors `content`, stamping the commitment with the current time.
    pub async fn anchor(&self, content: &TraceContent) -> Result<AnchoredTrace, AnchorError> {
        self.anchor_at(content, chrono::Utc::now().timestamp()).await
    }

    /// Anchors `content` with an explicit unix timestamp.
    pub async fn anchor_at(
        &self,
        content: &TraceContent,
        timestamp: i64,
    ) -> Result<AnchoredTrace, AnchorError> {
        let committed = self.committer.commit(content)?;
        self.anchor_committed(committed, timestamp).await
    }

    /// Stores and anchors an already committed trace.
    pub async fn anchor_committed(
        &self,
        committed: CommittedTrace,
        timestamp: i64,
    ) -> Result<AnchoredTrace, AnchorError> {
        let CommittedTrace { record, bytes } = committed;
        let session_id = record.content.session.id.clone();

        let cid = self.store.put(bytes.as_bytes()).await?;
        self.store.pin(&cid).await?;
        tracing::debug!(session_id = %session_id, cid = %cid, size = bytes.len(), "stored and pinned trace");

        let mut payload = CommitmentPayload::new(
            cid.clone(),
            record.hashing.root.clone(),
            session_id.clone(),
            record.content.model.name.clone(),
            timestamp,
        );
        let chunk_size = record.hashing.chunk_size;
        if chunk_size != DEFAULT_CHUNK_SIZE {
            tracing::warn!(
                session_id = %session_id,
                chunk_size,
                default = DEFAULT_CHUNK_SIZE,
                "anchoring with a non-default chunk size; recorded in the payload version"
            );
            payload = payload.with_chunk_size(chunk_size);
        }

        let receipt = match self.ledger.anchor_payload(payload).await {
            Ok(receipt) => receipt,
            Err(source) => {
                tracing::warn!(
                    session_id = %session_id,
                    cid = %cid,
                    error = %source,
                    "ledger anchoring failed; stored content left pinned"
                );
                return Err(AnchorError::Ledger {
                    source,
                    orphaned: cid,
                });
            }
        };

        let provenance = Provenance {
            hashing: record.hashing.clone(),
            content_id: Some(cid.clone()),
            anchor: Some(AnchorRef {
                tx_ref: receipt.tx_ref.clone(),
                ledger_index: receipt.ledger_index,
                network: receipt.network.clone(),
            }),
        };
        tracing::info!(
            session_id = %session_id,
            cid = %cid,
            tx_ref = %receipt.tx_ref,
            ledger_index = receipt.ledger_index,
            "trace anchored"
        );
        Ok(AnchoredTrace {
            ipfs_url: format!("{}{}", IPFS_SCHEME, cid),
            event_count: record.content.events.len(),
            receipt,
            record,
            provenance,
        })
    }
}
