//! The database: one replicated event log behind a store-facing API.
//!
//! An [`EventLog`] glues the pure log core to its collaborators: entries
//! are persisted to a content-addressed block store before they count as
//! committed, new heads are announced over the pub/sub transport, and
//! remote announcements are folded back in by a background replicator.
//!
//! Opened offline, the database runs purely from local state. Offline
//! mode requires a caller-supplied identity, since no transport exists
//! to bootstrap one from; that check fails fast at open time.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::debug;

use driftlog_core::{
    canonical_bytes, decode_entry, AccessController, Entry, EntryId, IterOptions, JoinOutcome,
    Keypair, Log, OpenAccess, PublicKey, WriteAllowlist,
};
use driftlog_replication::{PubSub, ReplicationState, Replicator};
use driftlog_store::{AccessSnapshot, BlockStore, LogSnapshot};

use crate::error::{DatabaseError, Result};

/// How a database talks to peers.
pub enum ReplicationMode {
    /// Gossip heads over the given transport handle.
    Online(Arc<dyn PubSub>),
    /// No replication at all; the database is purely local.
    Offline,
}

/// Who may write to the log.
#[derive(Debug, Clone, Default)]
pub enum AccessConfig {
    /// Anyone may append.
    #[default]
    Open,
    /// Only these identities (plus the local one) may append.
    Allowlist(Vec<PublicKey>),
}

/// Options for opening a database.
#[derive(Default)]
pub struct EventLogOptions {
    /// The signing identity. Required in offline mode; generated fresh
    /// in online mode when absent.
    pub identity: Option<Keypair>,
    /// Write-access policy.
    pub access: AccessConfig,
}

impl EventLogOptions {
    /// Default options: no explicit identity, open access.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit signing identity.
    pub fn identity(mut self, keypair: Keypair) -> Self {
        self.identity = Some(keypair);
        self
    }

    /// Restrict writes to an allowlist (the local identity is always
    /// included).
    pub fn allowlist(mut self, writers: impl IntoIterator<Item = PublicKey>) -> Self {
        self.access = AccessConfig::Allowlist(writers.into_iter().collect());
        self
    }
}

/// A replicated append-only event log.
pub struct EventLog<B: BlockStore + 'static> {
    address: String,
    identity: PublicKey,
    log: Arc<Mutex<Log>>,
    blocks: Arc<B>,
    replicator: Option<Arc<Replicator<B>>>,
    replication_task: Option<tokio::task::JoinHandle<()>>,
    access: AccessSnapshot,
}

impl<B: BlockStore + 'static> EventLog<B> {
    /// Open a database at `address`.
    ///
    /// In online mode the replicator starts listening on the address
    /// topic immediately. Offline mode fails fast with a configuration
    /// error when no identity is supplied.
    pub fn open(
        address: impl Into<String>,
        blocks: Arc<B>,
        mode: ReplicationMode,
        options: EventLogOptions,
    ) -> Result<Self> {
        let address = address.into();

        let keypair = match (&mode, options.identity) {
            (ReplicationMode::Offline, None) => {
                return Err(DatabaseError::Configuration(
                    "offline mode requires an explicit identity".into(),
                ));
            }
            (_, Some(keypair)) => keypair,
            (ReplicationMode::Online(_), None) => Keypair::generate(),
        };
        let identity = keypair.public_key();

        let (controller, access): (Arc<dyn AccessController>, AccessSnapshot) =
            match options.access {
                AccessConfig::Open => (Arc::new(OpenAccess), AccessSnapshot::open()),
                AccessConfig::Allowlist(mut writers) => {
                    writers.push(identity);
                    let acl = WriteAllowlist::from_keys(writers);
                    let snapshot = AccessSnapshot::allowlist(acl.writers().copied());
                    (Arc::new(acl), snapshot)
                }
            };

        let log = Arc::new(Mutex::new(Log::new(
            address.clone(),
            keypair,
            controller,
        )));

        let (replicator, replication_task) = match mode {
            ReplicationMode::Online(pubsub) => {
                let replicator = Arc::new(Replicator::new(
                    address.clone(),
                    log.clone(),
                    blocks.clone(),
                    pubsub,
                ));
                let task = {
                    let replicator = replicator.clone();
                    tokio::spawn(async move {
                        if let Err(e) = replicator.run().await {
                            tracing::warn!(error = %e, "replication loop ended");
                        }
                    })
                };
                (Some(replicator), Some(task))
            }
            ReplicationMode::Offline => (None, None),
        };

        debug!(address = %address, online = replicator.is_some(), "database open");
        Ok(Self {
            address,
            identity,
            log,
            blocks,
            replicator,
            replication_task,
            access,
        })
    }

    /// Rebuild a database from a snapshot, fetching every listed entry
    /// from the block store. No network access is involved.
    pub async fn from_snapshot(
        snapshot: &LogSnapshot,
        blocks: Arc<B>,
        mode: ReplicationMode,
        identity: Option<Keypair>,
    ) -> Result<Self> {
        let access = if snapshot.access.open {
            AccessConfig::Open
        } else {
            AccessConfig::Allowlist(snapshot.access.writers.clone())
        };

        let db = Self::open(
            snapshot.address.clone(),
            blocks,
            mode,
            EventLogOptions {
                identity,
                access,
            },
        )?;

        let mut entries = Vec::with_capacity(snapshot.entry_ids.len());
        for id in &snapshot.entry_ids {
            let bytes = db.blocks.get(id).await?;
            let entry =
                decode_entry(&bytes).map_err(|e| DatabaseError::Codec(e.to_string()))?;
            entries.push(entry);
        }
        db.log.lock().await.join(entries);

        Ok(db)
    }

    /// The database address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The local signing identity.
    pub fn identity(&self) -> PublicKey {
        self.identity
    }

    /// Whether replication is enabled.
    pub fn is_online(&self) -> bool {
        self.replicator.is_some()
    }

    /// Current replication state, if online.
    pub fn replication_state(&self) -> Option<ReplicationState> {
        self.replicator.as_ref().map(|r| r.state())
    }

    /// Append a payload.
    ///
    /// The entry is persisted to the block store before it is linked
    /// into the log; a failed persist leaves the log untouched. New
    /// heads are announced to peers afterwards.
    pub async fn add(&self, payload: impl Into<Bytes>) -> Result<(EntryId, Entry)> {
        let entry = {
            let mut log = self.log.lock().await;
            let entry = log.draft(payload)?;
            self.blocks.put(canonical_bytes(&entry).into()).await?;
            log.commit(entry.clone());
            entry
        };

        if let Some(replicator) = &self.replicator {
            replicator.announce().await?;
        }
        Ok((entry.id(), entry))
    }

    /// Look up an entry by id.
    pub async fn get(&self, id: &EntryId) -> Option<Entry> {
        self.log.lock().await.get(id).cloned()
    }

    /// Merge a batch of entries, persisting whatever is admitted.
    ///
    /// Returns the per-entry outcome; dropped entries are reported, not
    /// errors. New heads are announced when anything changed.
    pub async fn join(&self, entries: impl IntoIterator<Item = Entry>) -> Result<JoinOutcome> {
        let (outcome, admitted) = {
            let mut log = self.log.lock().await;
            let outcome = log.join(entries);
            let admitted: Vec<Bytes> = outcome
                .joined
                .iter()
                .filter_map(|id| log.get(id))
                .map(|entry| Bytes::from(canonical_bytes(entry)))
                .collect();
            (outcome, admitted)
        };

        for bytes in admitted {
            self.blocks.put(bytes).await?;
        }

        if !outcome.joined.is_empty() {
            if let Some(replicator) = &self.replicator {
                replicator.announce().await?;
            }
        }
        Ok(outcome)
    }

    /// Read entries newest-first.
    ///
    /// Materializes one consistent snapshot under the log lock; reverse
    /// the result for chronological order.
    pub async fn iterator(&self, options: IterOptions) -> Vec<Entry> {
        let log = self.log.lock().await;
        log.iter(options).cloned().collect()
    }

    /// Current head ids, in id order.
    pub async fn heads(&self) -> Vec<EntryId> {
        self.log.lock().await.heads()
    }

    /// Number of known entries.
    pub async fn len(&self) -> usize {
        self.log.lock().await.len()
    }

    /// Whether the log is empty.
    pub async fn is_empty(&self) -> bool {
        self.log.lock().await.is_empty()
    }

    /// Discard all but the `n` newest entries. Local storage trimming
    /// only; replication does not depend on it.
    pub async fn truncate(&self, n: usize) {
        self.log.lock().await.truncate(n);
    }

    /// Capture a reloadable snapshot of local state.
    pub async fn snapshot(&self) -> LogSnapshot {
        let log = self.log.lock().await;
        LogSnapshot::capture(&log, self.access.clone())
    }

    /// Stop replication and drop the database handle.
    pub fn close(self) {
        // Drop does the work.
    }
}

impl<B: BlockStore + 'static> Drop for EventLog<B> {
    fn drop(&mut self) {
        if let Some(task) = self.replication_task.take() {
            task.abort();
        }
    }
}
