//! # driftlog-store
//!
//! Storage collaborators for driftlog: the content-addressed
//! [`BlockStore`] trait with an in-memory implementation, and
//! [`LogSnapshot`] persistence of local log state.
//!
//! The log core treats storage as external: entries are handed over as
//! canonical bytes and come back by content id. Snapshots list ids and
//! heads so a log can be rebuilt from the block store with no network.

pub mod error;
pub mod memory;
pub mod snapshot;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryBlockStore;
pub use snapshot::{AccessSnapshot, LogSnapshot};
pub use traits::BlockStore;
