//! Ledger abstraction.

use a2a_canonical::{ContentId, HexDigest, SessionId, TxRef};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::payload::CommitmentPayload;
use crate::receipt::{AnchorReceipt, LedgerInclusion};

/// Commitment read back from a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchoredPayload {
    /// Decoded payload.
    pub payload: CommitmentPayload,
    /// Ledger index, when the transaction is in a validated ledger.
    pub ledger_index: Option<u64>,
}

/// Append-only ledger that carries commitment payloads.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Network tag reported in receipts.
    fn network(&self) -> &str;

    /// Submits a transaction carrying `payload` and waits for validated
    /// inclusion.
    async fn submit(&self, payload: &CommitmentPayload) -> Result<LedgerInclusion, LedgerError>;

    /// Reads the commitment attached to `tx_ref`.
    ///
    /// Returns `Ok(None)` when the transaction has no attachment.
    async fn read(&self, tx_ref: &TxRef) -> Result<Option<AnchoredPayload>, LedgerError>;

    /// Builds the commitment payload, submits it and returns the receipt.
    async fn anchor(
        &self,
        content_id: &ContentId,
        merkle_root: &HexDigest,
        session_id: &SessionId,
        model: &str,
        timestamp: i64,
    ) -> Result<AnchorReceipt, LedgerError> {
        let payload = CommitmentPayload::new(
            content_id.clone(),
            merkle_root.clone(),
            session_id.clone(),
            model,
            timestamp,
        );
        self.anchor_payload(payload).await
    }

    /// Submits a prepared payload and returns the receipt.
    async fn anchor_payload(&self, payload: CommitmentPayload) -> Result<AnchorReceipt, LedgerError> {
        let inclusion = self.submit(&payload).await?;
        tracing::info!(
            session_id = %payload.sid,
            cid = %payload.cid,
            tx_ref = %inclusion.tx_ref,
            ledger_index = inclusion.ledger_index,
            network = self.network(),
            "anchored commitment"
        );
        Ok(AnchorReceipt {
            content_id: payload.cid,
            merkle_root: payload.root,
            session_id: payload.sid,
            timestamp: payload.ts,
            model: payload.model,
            tx_ref: inclusion.tx_ref,
            ledger_index: inclusion.ledger_index,
            network: self.network().to_string(),
        })
    }
}

#[async_trait]
impl<L: Ledger + ?Sized> Ledger for std::sync::Arc<L> {
    fn network(&self) -> &str {
        (**self).network()
    }

    async fn submit(&self, payload: &CommitmentPayload) -> Result<LedgerInclusion, LedgerError> {
        (**self).submit(payload).await
    }

    async fn read(&self, tx_ref: &TxRef) -> Result<Option<AnchoredPayload>, LedgerError> {
        (**self).read(tx_ref).await
    }
}
