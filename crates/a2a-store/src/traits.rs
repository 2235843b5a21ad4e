//! Content store abstraction.

use a2a_canonical::ContentId;
use async_trait::async_trait;

use crate::error::StoreError;

/// Content-addressed byte store.
///
/// Implementations must return exactly the bytes that were put: no
/// re-encoding, no reformatting. Identical bytes always map to the same
/// [`ContentId`], regardless of call order or prior state.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Stores `bytes` and returns the identifier computed by the store.
    async fn put(&self, bytes: &[u8]) -> Result<ContentId, StoreError>;

    /// Fetches the bytes stored under `cid`.
    async fn get(&self, cid: &ContentId) -> Result<Vec<u8>, StoreError>;

    /// Protects `cid` from garbage collection.
    async fn pin(&self, cid: &ContentId) -> Result<(), StoreError>;

    /// Releases a previous pin.
    async fn unpin(&self, cid: &ContentId) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: ContentStore + ?Sized> ContentStore for std::sync::Arc<S> {
    async fn put(&self, bytes: &[u8]) -> Result<ContentId, StoreError> {
        (**self).put(bytes).await
    }

    async fn get(&self, cid: &ContentId) -> Result<Vec<u8>, StoreError> {
        (**self).get(cid).await
    }

    async fn pin(&self, cid: &ContentId) -> Result<(), StoreError> {
        (**self).pin(cid).await
    }

    async fn unpin(&self, cid: &ContentId) -> Result<(), StoreError> {
        (**self).unpin(cid).await
    }
}
