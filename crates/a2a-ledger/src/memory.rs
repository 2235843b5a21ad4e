//! In-process append-only ledger.

use a2a_canonical::TxRef;
use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::error::LedgerError;
use crate::payload::{decode_first, encode_memo, CommitmentPayload, Memo};
use crate::receipt::LedgerInclusion;
use crate::traits::{AnchoredPayload, Ledger};

/// First ledger index handed out.
const GENESIS_INDEX: u64 = 1;

#[derive(Debug, Clone)]
struct Transaction {
    ledger_index: Option<u64>,
    memos: Vec<Memo>,
}

#[derive(Debug)]
struct LedgerState {
    transactions: HashMap<TxRef, Transaction>,
    next_index: u64,
    rejection: Option<String>,
    confirming: bool,
    available: bool,
    mutations: u64,
}

/// Ledger kept in memory.
///
/// Every accepted transaction is validated immediately in its own ledger,
/// with monotonically increasing indices. Hooks simulate rejections,
/// confirmation timeouts, outages, pending and foreign transactions.
#[derive(Debug)]
pub struct MemoryLedger {
    network: String,
    state: Mutex<LedgerState>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    /// Creates an empty ledger with network tag `memory`.
    pub fn new() -> Self {
        Self::with_network("memory")
    }

    /// Creates an empty ledger with the given network tag.
    pub fn with_network(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            state: Mutex::new(LedgerState {
                transactions: HashMap::new(),
                next_index: GENESIS_INDEX,
                rejection: None,
                confirming: true,
                available: true,
                mutations: 0,
            }),
        }
    }

    /// Rejects every subsequent submission with result `code`.
    pub fn reject_with(&self, code: impl Into<String>) {
        self.state.lock().rejection = Some(code.into());
    }

    /// Accepts submissions again after [`reject_with`](Self::reject_with).
    pub fn clear_rejection(&self) {
        self.state.lock().rejection = None;
    }

    /// When `false`, submissions never confirm and fail with
    /// [`LedgerError::NotConfirmed`].
    pub fn set_confirming(&self, confirming: bool) {
        self.state.lock().confirming = confirming;
    }

    /// Makes every call fail with [`LedgerError::Unavailable`] (`false`).
    pub fn set_available(&self, available: bool) {
        self.state.lock().available = available;
    }

    /// Records a transaction without any memo.
    pub fn record_without_memo(&self) -> TxRef {
        self.append(Vec::new()).tx_ref
    }

    /// Records a transaction carrying `memo` as is.
    pub fn record_with_memo(&self, memo: Memo) -> TxRef {
        self.append(vec![memo]).tx_ref
    }

    /// Records a transaction carrying `memo` that never reaches a
    /// validated ledger.
    pub fn record_pending(&self, memo: Memo) -> TxRef {
        let mut state = self.state.lock();
        let (tx_ref, _) = Self::insert(&mut state, &self.network, vec![memo], false);
        tx_ref
    }

    /// Number of recorded transactions.
    pub fn len(&self) -> usize {
        self.state.lock().transactions.len()
    }

    /// True when no transaction has been recorded.
    pub fn is_empty(&self) -> bool {
        self.state.lock().transactions.is_empty()
    }

    /// Count of state-changing calls.
    pub fn mutation_count(&self) -> u64 {
        self.state.lock().mutations
    }

    fn append(&self, memos: Vec<Memo>) -> LedgerInclusion {
        let mut state = self.state.lock();
        let (tx_ref, ledger_index) = Self::insert(&mut state, &self.network, memos, true);
        LedgerInclusion {
            tx_ref,
            ledger_index,
        }
    }

    fn insert(
        state: &mut LedgerState,
        network: &str,
        memos: Vec<Memo>,
        validated: bool,
    ) -> (TxRef, u64) {
        let ledger_index = state.next_index;
        state.next_index += 1;
        state.mutations += 1;
        let tx_ref = transaction_ref(network, ledger_index, &memos);
        state.transactions.insert(
            tx_ref.clone(),
            Transaction {
                ledger_index: validated.then_some(ledger_index),
                memos,
            },
        );
        (tx_ref, ledger_index)
    }

    fn check_available(&self) -> Result<(), LedgerError> {
        if self.state.lock().available {
            Ok(())
        } else {
            Err(LedgerError::Unavailable("memory ledger is offline".to_string()))
        }
    }
}

/// Transaction references are SHA-256 over network, index and memo data,
/// upper-case hex like XRPL hashes.
fn transaction_ref(network: &str, ledger_index: u64, memos: &[Memo]) -> TxRef {
    let mut hasher = Sha256::new();
    hasher.update(network.as_bytes());
    hasher.update(ledger_index.to_be_bytes());
    for memo in memos {
        for field in [&memo.memo_type, &memo.memo_format, &memo.memo_data] {
            hasher.update(field.as_deref().unwrap_or("").as_bytes());
            hasher.update([0u8]);
        }
    }
    TxRef::new(hex::encode_upper(hasher.finalize()))
}

#[async_trait]
impl Ledger for MemoryLedger {
    fn network(&self) -> &str {
        &self.network
    }

    async fn submit(&self, payload: &CommitmentPayload) -> Result<LedgerInclusion, LedgerError> {
        self.check_available()?;
        let memo = encode_memo(payload)?;
        {
            let state = self.state.lock();
            if let Some(code) = &state.rejection {
                return Err(LedgerError::SubmissionRejected {
                    code: code.clone(),
                    message: "rejected by memory ledger".to_string(),
                });
            }
            if !state.confirming {
                return Err(LedgerError::NotConfirmed(
                    "memory ledger is withholding confirmation".to_string(),
                ));
            }
        }
        let inclusion = self.append(vec![memo]);
        tracing::debug!(
            tx_ref = %inclusion.tx_ref,
            ledger_index = inclusion.ledger_index,
            "memory ledger accepted transaction"
        );
        Ok(inclusion)
    }

    async fn read(&self, tx_ref: &TxRef) -> Result<Option<AnchoredPayload>, LedgerError> {
        self.check_available()?;
        let key = TxRef::new(tx_ref.as_str().to_ascii_uppercase());
        let tx = self
            .state
            .lock()
            .transactions
            .get(&key)
            .cloned()
            .ok_or_else(|| LedgerError::TransactionNotFound(tx_ref.clone()))?;
        Ok(decode_first(&tx.memos)?.map(|payload| AnchoredPayload {
            payload,
            ledger_index: tx.ledger_index,
        }))
    }
}
