//! # driftlog-replication
//!
//! The replication protocol for driftlog: head announcements over a
//! topic-based [`PubSub`] transport, graph-diff fetches through the
//! block store, and merge-on-receive into the local log.
//!
//! The protocol is deliberately thin. Peers gossip only head pointers;
//! entry bodies are pulled from content-addressed storage on demand, and
//! the log's join does the rest. Nothing here retries or schedules:
//! convergence is eventual and driven by whatever announcements arrive.

pub mod error;
pub mod messages;
pub mod replicator;
pub mod transport;

pub use error::{ReplicationError, Result};
pub use messages::{HeadAnnouncement, MAX_ANNOUNCED_HEADS};
pub use replicator::{ReplicationState, Replicator, SyncOutcome};
pub use transport::{memory::MemoryPubSub, PubSub};
