//! Snapshot persistence of local log state.
//!
//! A snapshot records everything needed to rebuild a log from the block
//! store without any network access: the set of known entry ids, the
//! current heads, and the log's access-control metadata. Entry bodies
//! themselves live in the block store; the snapshot only lists them.

use std::fs;
use std::path::Path;

use driftlog_core::{EntryId, Log, PublicKey};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Access-control metadata carried in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessSnapshot {
    /// True for a public log (anyone may write).
    pub open: bool,
    /// Authorized writer keys; ignored when `open` is set.
    pub writers: Vec<PublicKey>,
}

impl AccessSnapshot {
    /// Metadata for a public log.
    pub fn open() -> Self {
        Self {
            open: true,
            writers: Vec::new(),
        }
    }

    /// Metadata for an allowlisted log.
    pub fn allowlist(writers: impl IntoIterator<Item = PublicKey>) -> Self {
        Self {
            open: false,
            writers: writers.into_iter().collect(),
        }
    }
}

/// A reloadable description of one database's local state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSnapshot {
    /// The database address.
    pub address: String,
    /// Every known entry id, in id order.
    pub entry_ids: Vec<EntryId>,
    /// The heads at capture time, in id order.
    pub heads: Vec<EntryId>,
    /// Access-control metadata.
    pub access: AccessSnapshot,
}

impl LogSnapshot {
    /// Capture the current state of a log.
    pub fn capture(log: &Log, access: AccessSnapshot) -> Self {
        let mut entry_ids: Vec<EntryId> = log.entries().map(|e| e.id()).collect();
        entry_ids.sort_unstable();
        Self {
            address: log.id().to_string(),
            entry_ids,
            heads: log.heads(),
            access,
        }
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| StoreError::Codec(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| StoreError::Codec(e.to_string()))
    }

    /// Write the snapshot to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Read a snapshot back from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}
