//! In-memory implementation of the BlockStore trait.
//!
//! Used by tests and by offline databases. Same semantics as any durable
//! backend, no persistence: all blocks are lost when the store drops.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use driftlog_core::EntryId;

use crate::error::{Result, StoreError};
use crate::traits::BlockStore;

/// In-memory block store. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryBlockStore {
    blocks: RwLock<HashMap<EntryId, Bytes>>,
}

impl MemoryBlockStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks held.
    pub fn len(&self) -> usize {
        self.blocks.read().unwrap().len()
    }

    /// Whether the store holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.read().unwrap().is_empty()
    }

    /// Drop a block, simulating an unreachable peer in tests.
    pub fn evict(&self, id: &EntryId) -> bool {
        self.blocks.write().unwrap().remove(id).is_some()
    }
}

#[async_trait]
impl BlockStore for MemoryBlockStore {
    async fn put(&self, bytes: Bytes) -> Result<EntryId> {
        let id = EntryId::hash(&bytes);
        self.blocks.write().unwrap().entry(id).or_insert(bytes);
        Ok(id)
    }

    async fn get(&self, id: &EntryId) -> Result<Bytes> {
        self.blocks
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(*id))
    }

    async fn has(&self, id: &EntryId) -> Result<bool> {
        Ok(self.blocks.read().unwrap().contains_key(id))
    }
}
