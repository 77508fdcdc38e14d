//! # driftlog
//!
//! A peer-to-peer, eventually-consistent, append-only log database.
//!
//! Every database is a local replica of a DAG of signed, content-
//! addressed entries. Replicas merge with [`EventLog::join`] and
//! converge on identical state regardless of the order entries arrive
//! in; reads go through a deterministic newest-first iterator.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use driftlog::{EventLog, EventLogOptions, IterOptions, ReplicationMode};
//! use driftlog::core::Keypair;
//! use driftlog::store::MemoryBlockStore;
//!
//! async fn example() {
//!     let blocks = Arc::new(MemoryBlockStore::new());
//!     let db = EventLog::open(
//!         "/driftlog/example",
//!         blocks,
//!         ReplicationMode::Offline,
//!         EventLogOptions::new().identity(Keypair::generate()),
//!     )
//!     .unwrap();
//!
//!     let (hash, _entry) = db.add(b"hello".to_vec()).await.unwrap();
//!     let items = db.iterator(IterOptions::all()).await;
//!     assert_eq!(items[0].id(), hash);
//! }
//! ```
//!
//! ## Re-exports
//!
//! The component crates are re-exported for convenience:
//!
//! - `driftlog::core` - Entries, clocks, the log DAG, iteration
//! - `driftlog::store` - Block store and snapshots
//! - `driftlog::replication` - Pub/sub transport and the replicator

pub mod database;
pub mod error;

// Re-export component crates
pub use driftlog_core as core;
pub use driftlog_replication as replication;
pub use driftlog_store as store;

// Re-export main types for convenience
pub use database::{AccessConfig, EventLog, EventLogOptions, ReplicationMode};
pub use error::{DatabaseError, Result};

// Re-export commonly used component types
pub use driftlog_core::{
    causal_cmp, Entry, EntryId, IterOptions, JoinOutcome, Keypair, LamportClock, Log, PublicKey,
};
pub use driftlog_replication::{MemoryPubSub, PubSub, ReplicationState};
pub use driftlog_store::{BlockStore, LogSnapshot, MemoryBlockStore};
