//! In-process content store.

use a2a_canonical::ContentId;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

use crate::cid::cid_v1_raw;
use crate::error::StoreError;
use crate::traits::ContentStore;

#[derive(Debug)]
struct MemoryState {
    blobs: HashMap<ContentId, Vec<u8>>,
    pins: HashSet<ContentId>,
    available: bool,
    mutations: u64,
}

/// Content store kept in memory, addressed by CIDv1.
///
/// Used for tests and offline runs. An availability switch simulates an
/// unreachable node.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty, reachable store.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                blobs: HashMap::new(),
                pins: HashSet::new(),
                available: true,
                mutations: 0,
            }),
        }
    }

    /// Makes every subsequent call fail with [`StoreError::Unavailable`]
    /// (`false`) or succeed again (`true`).
    pub fn set_available(&self, available: bool) {
        self.state.lock().available = available;
    }

    /// True when `cid` is pinned.
    pub fn is_pinned(&self, cid: &ContentId) -> bool {
        self.state.lock().pins.contains(cid)
    }

    /// Number of distinct blobs stored.
    pub fn len(&self) -> usize {
        self.state.lock().blobs.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.state.lock().blobs.is_empty()
    }

    /// Count of state-changing calls (put, pin, unpin, corrupt).
    pub fn mutation_count(&self) -> u64 {
        self.state.lock().mutations
    }

    /// Replaces the bytes stored under `cid`, simulating tampering at the
    /// storage layer. Returns false when `cid` is unknown.
    pub fn corrupt(&self, cid: &ContentId, bytes: Vec<u8>) -> bool {
        let mut state = self.state.lock();
        state.mutations += 1;
        match state.blobs.get_mut(cid) {
            Some(slot) => {
                *slot = bytes;
                true
            }
            None => false,
        }
    }

    fn check_available(state: &MemoryState) -> Result<(), StoreError> {
        if state.available {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn put(&self, bytes: &[u8]) -> Result<ContentId, StoreError> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;
        let cid = cid_v1_raw(bytes);
        state.mutations += 1;
        state
            .blobs
            .entry(cid.clone())
            .or_insert_with(|| bytes.to_vec());
        tracing::debug!(cid = %cid, size = bytes.len(), "stored content in memory");
        Ok(cid)
    }

    async fn get(&self, cid: &ContentId) -> Result<Vec<u8>, StoreError> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        state
            .blobs
            .get(cid)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(cid.clone()))
    }

    async fn pin(&self, cid: &ContentId) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;
        if !state.blobs.contains_key(cid) {
            return Err(StoreError::NotFound(cid.clone()));
        }
        state.mutations += 1;
        state.pins.insert(cid.clone());
        Ok(())
    }

    async fn unpin(&self, cid: &ContentId) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;
        if !state.blobs.contains_key(cid) {
            return Err(StoreError::NotFound(cid.clone()));
        }
        state.mutations += 1;
        state.pins.remove(cid);
        Ok(())
    }
}
