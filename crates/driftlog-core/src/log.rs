//! The log: a DAG of signed entries with deterministic merge.
//!
//! A `Log` owns a mapping from content id to [`Entry`] plus two derived
//! sets: the heads (entries no known entry points back to) and the tails
//! (entries none of whose parents are known). It grows through local
//! [`Log::append`] and through [`Log::join`], which merges entries from
//! any other replica. Join is commutative, associative, and idempotent,
//! so replicas converge on the same state regardless of message order or
//! duplication.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;

use crate::access::AccessController;
use crate::clock::LamportClock;
use crate::crypto::{Keypair, PublicKey};
use crate::entry::{Entry, EntryBuilder};
use crate::error::AppendError;
use crate::id::EntryId;
use crate::order::CausalKey;
use crate::validation::validate_entry;

/// Why an incoming entry was dropped during a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The entry belongs to a different log.
    WrongLog,
    /// Structural or signature validation failed.
    Invalid,
    /// The access controller refused the author.
    AccessDenied,
    /// The entry's clock is not strictly ahead of a known parent's.
    ClockRegression,
}

/// Result of a join: which entries were admitted and which were dropped.
///
/// A join never fails wholesale; invalid entries are dropped one by one
/// and reported here.
#[derive(Debug, Clone, Default)]
pub struct JoinOutcome {
    /// Ids of entries newly admitted, in the order they were linked.
    pub joined: Vec<EntryId>,
    /// Entries rejected, with the reason each was dropped.
    pub dropped: Vec<(EntryId, DropReason)>,
}

impl JoinOutcome {
    /// Whether the join changed nothing (and dropped nothing).
    pub fn is_noop(&self) -> bool {
        self.joined.is_empty() && self.dropped.is_empty()
    }
}

/// A local replica of one log's entry DAG.
#[derive(Clone)]
pub struct Log {
    id: String,
    keypair: Keypair,
    access: Arc<dyn AccessController>,
    entries: HashMap<EntryId, Entry>,
    /// Every id that appears in some known entry's `next`.
    referenced: HashSet<EntryId>,
    heads: BTreeSet<EntryId>,
    clock: LamportClock,
}

impl Log {
    /// Create an empty log.
    pub fn new(id: impl Into<String>, keypair: Keypair, access: Arc<dyn AccessController>) -> Self {
        let clock = LamportClock::new(keypair.public_key());
        Self {
            id: id.into(),
            keypair,
            access,
            entries: HashMap::new(),
            referenced: HashSet::new(),
            heads: BTreeSet::new(),
            clock,
        }
    }

    /// The log's address.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The local identity this log signs with.
    pub fn identity(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// The local logical clock.
    pub fn clock(&self) -> &LamportClock {
        &self.clock
    }

    /// Number of known entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an entry is present.
    pub fn contains(&self, id: &EntryId) -> bool {
        self.entries.contains_key(id)
    }

    /// Look up an entry by id.
    pub fn get(&self, id: &EntryId) -> Option<&Entry> {
        self.entries.get(id)
    }

    /// Current heads: entries with no known descendant, in id order.
    pub fn heads(&self) -> Vec<EntryId> {
        self.heads.iter().copied().collect()
    }

    /// Current tails: entries none of whose parents are known, in id
    /// order. Relevant after truncation or under partial replication.
    pub fn tails(&self) -> Vec<EntryId> {
        let mut tails: Vec<EntryId> = self
            .entries
            .iter()
            .filter(|(_, e)| e.next.iter().all(|p| !self.entries.contains_key(p)))
            .map(|(id, _)| *id)
            .collect();
        tails.sort_unstable();
        tails
    }

    /// All known entries, in arbitrary order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Build and sign the next entry without linking it.
    ///
    /// The entry references all current heads and carries a clock one
    /// ahead of the newest parent. The access controller is consulted
    /// here; a denial leaves the log unchanged. The caller is expected
    /// to persist the drafted entry, then [`Log::commit`] it.
    pub fn draft(&self, payload: impl Into<Bytes>) -> Result<Entry, AppendError> {
        let next: Vec<EntryId> = self.heads.iter().copied().collect();
        let time = next
            .iter()
            .filter_map(|h| self.entries.get(h))
            .map(|e| e.clock.time)
            .max()
            .map_or(0, |t| t + 1);

        let entry = EntryBuilder::new(self.id.as_str())
            .time(time)
            .parents(next)
            .payload(payload)
            .sign(&self.keypair);

        let author = self.keypair.public_key();
        if !self.access.can_append(&author, &entry) {
            return Err(AppendError::PermissionDenied(author));
        }
        Ok(entry)
    }

    /// Link a drafted entry: insert it, retire its parents from the head
    /// set, and advance the local clock.
    pub fn commit(&mut self, entry: Entry) -> EntryId {
        let id = entry.id();
        if !self.entries.contains_key(&id) {
            self.insert_unchecked(id, entry);
        }
        id
    }

    /// Draft and commit in one step, for purely in-memory use.
    pub fn append(&mut self, payload: impl Into<Bytes>) -> Result<Entry, AppendError> {
        let entry = self.draft(payload)?;
        self.commit(entry.clone());
        Ok(entry)
    }

    /// Merge a set of entries into this log.
    ///
    /// Entries already present are skipped (identity is by hash, so a
    /// duplicate join is a no-op). Entries that belong to another log,
    /// fail validation, are refused by the access controller, or whose
    /// clock does not advance past a known parent are dropped
    /// individually and reported in the outcome. Heads are recomputed
    /// incrementally; the local clock merges to the newest time seen.
    pub fn join(&mut self, entries: impl IntoIterator<Item = Entry>) -> JoinOutcome {
        let mut candidates: Vec<(EntryId, Entry)> =
            entries.into_iter().map(|e| (e.id(), e)).collect();

        // Oldest first, so parents are linked before their children and
        // the admitted set does not depend on arrival order.
        candidates.sort_unstable_by(|(a_id, a), (b_id, b)| {
            CausalKey::with_id(a, *a_id).cmp(&CausalKey::with_id(b, *b_id))
        });

        let mut outcome = JoinOutcome::default();
        for (id, entry) in candidates {
            if self.entries.contains_key(&id) {
                continue;
            }
            if entry.log_id != self.id {
                outcome.dropped.push((id, DropReason::WrongLog));
                continue;
            }
            if validate_entry(&entry).is_err() {
                outcome.dropped.push((id, DropReason::Invalid));
                continue;
            }
            if !self.access.can_append(&entry.author, &entry) {
                outcome.dropped.push((id, DropReason::AccessDenied));
                continue;
            }
            if entry
                .next
                .iter()
                .filter_map(|p| self.entries.get(p))
                .any(|p| p.clock.time >= entry.clock.time)
            {
                outcome.dropped.push((id, DropReason::ClockRegression));
                continue;
            }

            self.insert_unchecked(id, entry);
            outcome.joined.push(id);
        }
        outcome
    }

    /// Merge everything another log knows into this one.
    pub fn join_log(&mut self, other: &Log) -> JoinOutcome {
        self.join(other.entries.values().cloned())
    }

    /// Discard all but the `n` newest entries by causal order.
    ///
    /// A local storage optimization only: dropped ancestors move the
    /// tails forward but never change the heads, and correctness of
    /// later joins does not depend on it.
    pub fn truncate(&mut self, n: usize) {
        if self.entries.len() <= n {
            return;
        }

        let mut keys: Vec<CausalKey> = self
            .entries
            .iter()
            .map(|(id, e)| CausalKey::with_id(e, *id))
            .collect();
        keys.sort_unstable_by(|a, b| b.cmp(a));
        keys.truncate(n);

        let keep: HashSet<EntryId> = keys.into_iter().map(|k| k.id).collect();
        self.entries.retain(|id, _| keep.contains(id));

        self.referenced = self
            .entries
            .values()
            .flat_map(|e| e.next.iter().copied())
            .collect();
        self.heads = self
            .entries
            .keys()
            .filter(|id| !self.referenced.contains(*id))
            .copied()
            .collect();
    }

    fn insert_unchecked(&mut self, id: EntryId, entry: Entry) {
        for parent in &entry.next {
            self.referenced.insert(*parent);
            self.heads.remove(parent);
        }
        if !self.referenced.contains(&id) {
            self.heads.insert(id);
        }
        self.clock.merge(entry.clock.time);
        self.entries.insert(id, entry);
    }
}

impl std::fmt::Debug for Log {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Log")
            .field("id", &self.id)
            .field("len", &self.entries.len())
            .field("heads", &self.heads)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{OpenAccess, WriteAllowlist};
    use crate::entry::EntryBuilder;

    fn open_log(id: &str, seed: u8) -> Log {
        Log::new(id, Keypair::from_seed(&[seed; 32]), Arc::new(OpenAccess))
    }

    #[test]
    fn test_append_links_and_advances_clock() {
        let mut log = open_log("log", 1);

        let e1 = log.append(b"hello1".to_vec()).unwrap();
        let e2 = log.append(b"hello2".to_vec()).unwrap();

        assert!(e2.clock.time > e1.clock.time);
        assert!(e2.next.contains(&e1.id()));
        assert_eq!(log.heads(), vec![e2.id()]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_empty_log() {
        let log = open_log("log", 1);
        assert!(log.is_empty());
        assert!(log.heads().is_empty());
        assert!(log.tails().is_empty());
    }

    #[test]
    fn test_root_is_tail() {
        let mut log = open_log("log", 1);
        let root = log.append(b"root".to_vec()).unwrap();
        log.append(b"next".to_vec()).unwrap();

        assert_eq!(log.tails(), vec![root.id()]);
    }

    #[test]
    fn test_permission_denied_leaves_log_unchanged() {
        let owner = Keypair::from_seed(&[0x01; 32]);
        let other = Keypair::from_seed(&[0x02; 32]);
        let acl = Arc::new(WriteAllowlist::new(owner.public_key()));
        let mut log = Log::new("log", other, acl);

        let err = log.append(b"nope".to_vec()).unwrap_err();
        assert!(matches!(err, AppendError::PermissionDenied(_)));
        assert!(log.is_empty());
        assert!(log.heads().is_empty());
    }

    #[test]
    fn test_join_is_idempotent() {
        let mut a = open_log("log", 1);
        a.append(b"one".to_vec()).unwrap();
        a.append(b"two".to_vec()).unwrap();

        let mut b = open_log("log", 2);
        let first = b.join_log(&a);
        assert_eq!(first.joined.len(), 2);

        let second = b.join_log(&a);
        assert!(second.is_noop());
        assert_eq!(b.len(), 2);
        assert_eq!(b.heads(), a.heads());
    }

    #[test]
    fn test_join_is_commutative() {
        let mut a = open_log("log", 1);
        a.append(b"a1".to_vec()).unwrap();
        a.append(b"a2".to_vec()).unwrap();

        let mut b = open_log("log", 2);
        b.append(b"b1".to_vec()).unwrap();
        b.append(b"b2".to_vec()).unwrap();

        let mut ab = open_log("log", 3);
        ab.join_log(&a);
        ab.join_log(&b);

        let mut ba = open_log("log", 4);
        ba.join_log(&b);
        ba.join_log(&a);

        assert_eq!(ab.len(), 4);
        assert_eq!(ab.len(), ba.len());
        assert_eq!(ab.heads(), ba.heads());
    }

    #[test]
    fn test_append_after_join_merges_heads() {
        let mut a = open_log("log", 1);
        a.append(b"a1".to_vec()).unwrap();

        let mut b = open_log("log", 2);
        b.append(b"b1".to_vec()).unwrap();

        a.join_log(&b);
        assert_eq!(a.heads().len(), 2);

        let merge = a.append(b"merge".to_vec()).unwrap();
        assert_eq!(merge.next.len(), 2, "merge entry references all heads");
        assert_eq!(a.heads(), vec![merge.id()]);
        assert_eq!(merge.clock.time, 1);
    }

    #[test]
    fn test_join_drops_wrong_log() {
        let mut other = open_log("other-log", 1);
        let foreign = other.append(b"x".to_vec()).unwrap();

        let mut log = open_log("log", 2);
        let outcome = log.join([foreign.clone()]);

        assert!(outcome.joined.is_empty());
        assert_eq!(outcome.dropped, vec![(foreign.id(), DropReason::WrongLog)]);
        assert!(log.is_empty());
    }

    #[test]
    fn test_join_drops_invalid_but_keeps_valid() {
        let mut a = open_log("log", 1);
        let good = a.append(b"good".to_vec()).unwrap();

        let mut forged = EntryBuilder::new("log")
            .payload(b"forged".to_vec())
            .sign(&Keypair::from_seed(&[0x03; 32]));
        forged.payload = Bytes::from_static(b"tampered");
        let forged_id = forged.id();

        let mut b = open_log("log", 2);
        let outcome = b.join([good.clone(), forged]);

        assert_eq!(outcome.joined, vec![good.id()]);
        assert_eq!(outcome.dropped, vec![(forged_id, DropReason::Invalid)]);
    }

    #[test]
    fn test_join_drops_unauthorized_author() {
        let owner = Keypair::from_seed(&[0x01; 32]);
        let stranger = Keypair::from_seed(&[0x02; 32]);

        let mut theirs = Log::new("log", stranger, Arc::new(OpenAccess));
        let entry = theirs.append(b"hi".to_vec()).unwrap();

        let acl = Arc::new(WriteAllowlist::new(owner.public_key()));
        let mut mine = Log::new("log", owner, acl);
        let outcome = mine.join([entry.clone()]);

        assert!(outcome.joined.is_empty());
        assert_eq!(
            outcome.dropped,
            vec![(entry.id(), DropReason::AccessDenied)]
        );
    }

    #[test]
    fn test_truncate_keeps_newest_and_advances_tails() {
        let mut log = open_log("log", 1);
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(log.append(format!("entry{i}").into_bytes()).unwrap().id());
        }

        log.truncate(2);

        assert_eq!(log.len(), 2);
        assert!(log.contains(&ids[3]));
        assert!(log.contains(&ids[4]));
        assert_eq!(log.heads(), vec![ids[4]]);
        assert_eq!(log.tails(), vec![ids[3]]);
    }

    #[test]
    fn test_truncate_to_larger_size_is_noop() {
        let mut log = open_log("log", 1);
        log.append(b"only".to_vec()).unwrap();
        log.truncate(10);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_append_after_truncate_still_links() {
        let mut log = open_log("log", 1);
        for i in 0..4 {
            log.append(format!("e{i}").into_bytes()).unwrap();
        }
        log.truncate(1);

        let entry = log.append(b"after".to_vec()).unwrap();
        assert_eq!(entry.clock.time, 4, "clock keeps advancing past the cut");
        assert_eq!(log.heads(), vec![entry.id()]);
    }
}
