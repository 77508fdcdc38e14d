//! BlockStore trait: the content-addressed storage collaborator.
//!
//! The log core never talks to storage directly; it hands canonical
//! entry bytes to a block store and gets back the content id. Any
//! backend works as long as `get(put(bytes)) == bytes` and ids are
//! collision-free under Blake3.

use async_trait::async_trait;
use bytes::Bytes;
use driftlog_core::EntryId;

use crate::error::Result;

/// Content-addressed block storage.
///
/// # Design Notes
///
/// - **Idempotent puts**: storing the same bytes twice returns the same
///   id and keeps a single block.
/// - **Ids are derived, not chosen**: `put` computes the id from the
///   bytes; callers cannot pick where a block lands.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Store a block, returning its content id.
    async fn put(&self, bytes: Bytes) -> Result<EntryId>;

    /// Fetch a block by content id.
    ///
    /// Returns [`crate::StoreError::NotFound`] when the id is unknown.
    async fn get(&self, id: &EntryId) -> Result<Bytes>;

    /// Whether a block exists for this id.
    async fn has(&self, id: &EntryId) -> Result<bool>;
}
