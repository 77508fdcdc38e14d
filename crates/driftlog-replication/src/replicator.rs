//! The replicator: head gossip in, graph diff out.
//!
//! Each database address gets one replicator. After a local append the
//! replicator broadcasts the new heads; when a peer's announcement
//! arrives it walks backward from any unknown head through the block
//! store, collecting entries until it reaches history it already has,
//! and joins the batch into the local log.
//!
//! There is no session state between announcements: every announcement
//! triggers an independent `Idle → Syncing → Idle` pass, and because
//! joins are idempotent a repeated or interleaved announcement is a
//! harmless no-op.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use driftlog_core::{decode_entry, EntryId, Log};
use driftlog_store::BlockStore;

use crate::error::Result;
use crate::messages::HeadAnnouncement;
use crate::transport::PubSub;

/// Replication state for one database address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationState {
    /// Waiting for announcements.
    Idle,
    /// Currently fetching and merging a peer's heads.
    Syncing,
}

const STATE_IDLE: u8 = 0;
const STATE_SYNCING: u8 = 1;

/// Counters from one sync pass.
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    /// Entries fetched from the block store.
    pub fetched: usize,
    /// Entries newly merged into the log.
    pub joined: Vec<EntryId>,
    /// Entries the log refused (validation, access, wrong log).
    pub dropped: usize,
    /// Branches abandoned because a block was missing or undecodable.
    pub missing: usize,
}

impl SyncOutcome {
    /// Whether the pass changed nothing.
    pub fn is_noop(&self) -> bool {
        self.fetched == 0 && self.joined.is_empty() && self.dropped == 0 && self.missing == 0
    }
}

/// Replication driver for a single log.
pub struct Replicator<B: BlockStore> {
    address: String,
    log: Arc<Mutex<Log>>,
    blocks: Arc<B>,
    pubsub: Arc<dyn PubSub>,
    state: AtomicU8,
}

impl<B: BlockStore> Replicator<B> {
    /// Create a replicator for `address`, sharing the log and block
    /// store with its database.
    pub fn new(
        address: impl Into<String>,
        log: Arc<Mutex<Log>>,
        blocks: Arc<B>,
        pubsub: Arc<dyn PubSub>,
    ) -> Self {
        Self {
            address: address.into(),
            log,
            blocks,
            pubsub,
            state: AtomicU8::new(STATE_IDLE),
        }
    }

    /// The address this replicator serves.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Current state.
    pub fn state(&self) -> ReplicationState {
        match self.state.load(Ordering::Relaxed) {
            STATE_SYNCING => ReplicationState::Syncing,
            _ => ReplicationState::Idle,
        }
    }

    /// Broadcast the log's current heads on the address topic.
    pub async fn announce(&self) -> Result<()> {
        let heads = self.log.lock().await.heads();
        let announcement = HeadAnnouncement::new(self.address.clone(), heads);
        debug!(address = %self.address, heads = announcement.heads.len(), "announcing heads");
        self.pubsub
            .publish(&self.address, announcement.to_bytes()?)
            .await
    }

    /// Handle a peer's head announcement: fetch whatever is unknown and
    /// merge it in.
    pub async fn on_announcement(&self, announcement: &HeadAnnouncement) -> Result<SyncOutcome> {
        if announcement.address != self.address {
            debug!(
                got = %announcement.address,
                expected = %self.address,
                "ignoring announcement for another address"
            );
            return Ok(SyncOutcome::default());
        }

        self.state.store(STATE_SYNCING, Ordering::Relaxed);
        let result = self.sync(announcement).await;
        self.state.store(STATE_IDLE, Ordering::Relaxed);
        result
    }

    /// One sync pass: graph diff, then join.
    async fn sync(&self, announcement: &HeadAnnouncement) -> Result<SyncOutcome> {
        let mut outcome = SyncOutcome::default();

        let mut collected = HashMap::new();
        let mut queue: VecDeque<EntryId> = announcement.heads.iter().copied().collect();

        // Also retry holes left by earlier failed fetches: parents of
        // local tails that are still unresolved.
        {
            let log = self.log.lock().await;
            for tail_id in log.tails() {
                if let Some(tail) = log.get(&tail_id) {
                    for parent in &tail.next {
                        if !log.contains(parent) {
                            queue.push_back(*parent);
                        }
                    }
                }
            }
        }

        while let Some(id) = queue.pop_front() {
            if collected.contains_key(&id) {
                continue;
            }
            if self.log.lock().await.contains(&id) {
                // Reached history we already have; the diff ends here.
                continue;
            }

            let bytes = match self.blocks.get(&id).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    // The branch behind this block stays unmerged; a
                    // later announcement can complete it.
                    warn!(id = %id.to_hex(), error = %e, "block fetch failed, skipping branch");
                    outcome.missing += 1;
                    continue;
                }
            };

            let entry = match decode_entry(&bytes) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(id = %id.to_hex(), error = %e, "undecodable block, skipping branch");
                    outcome.missing += 1;
                    continue;
                }
            };

            if entry.id() != id {
                warn!(id = %id.to_hex(), "block content does not hash to its id, skipping branch");
                outcome.missing += 1;
                continue;
            }

            for parent in &entry.next {
                queue.push_back(*parent);
            }
            collected.insert(id, entry);
            outcome.fetched += 1;
        }

        if collected.is_empty() {
            return Ok(outcome);
        }

        let join = self.log.lock().await.join(collected.into_values());
        outcome.dropped = join.dropped.len();
        outcome.joined = join.joined;
        debug!(
            address = %self.address,
            joined = outcome.joined.len(),
            dropped = outcome.dropped,
            "sync pass complete"
        );
        Ok(outcome)
    }

    /// Consume announcements from the address topic until the transport
    /// closes the subscription.
    pub async fn run(&self) -> Result<()> {
        let mut rx = self.pubsub.subscribe(&self.address).await?;
        while let Some(bytes) = rx.recv().await {
            match HeadAnnouncement::from_bytes(&bytes) {
                Ok(announcement) => {
                    if let Err(e) = self.on_announcement(&announcement).await {
                        warn!(address = %self.address, error = %e, "sync failed");
                    }
                }
                Err(e) => {
                    warn!(address = %self.address, error = %e, "dropping undecodable announcement");
                }
            }
        }
        Ok(())
    }
}
