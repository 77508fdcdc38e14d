//! Lazy, range-aware iteration over a log.
//!
//! [`LogIter`] walks backward from the heads (or from an upper bound)
//! following `next` links, yielding entries newest-first in the total
//! order of [`crate::order`]. It borrows the log for its whole lifetime,
//! so the snapshot it observes cannot change underneath it; a new
//! iterator rereads the log and may see a different state.

use std::collections::{BinaryHeap, HashSet};

use crate::entry::Entry;
use crate::id::EntryId;
use crate::log::Log;
use crate::order::CausalKey;

/// A range boundary on an entry id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// The boundary entry itself is part of the range.
    Inclusive(EntryId),
    /// The boundary entry is outside the range.
    Exclusive(EntryId),
}

/// Iteration options: item limit and optional range bounds.
///
/// Defaults match the store API contract:
/// - `limit` absent or `Some(0)`: exactly one item (the newest);
/// - `limit` positive `n`: up to `n` newest items;
/// - `limit` negative: the entire reachable history.
///
/// The upper bound (`lt`/`lte`) relocates where traversal starts; if its
/// id is unknown the iterator yields nothing. The lower bound
/// (`gt`/`gte`) stops traversal when reached. Holding each side as a
/// single [`Bound`] keeps "at most one of gt/gte" (and lt/lte) true by
/// construction; setting the same side twice keeps the last value.
#[derive(Debug, Clone, Default)]
pub struct IterOptions {
    /// Item limit; see the policy above.
    pub limit: Option<i64>,
    /// Lower (oldest) boundary: where traversal stops.
    pub lower: Option<Bound>,
    /// Upper (newest) boundary: where traversal starts.
    pub upper: Option<Bound>,
}

impl IterOptions {
    /// Default options: one item, no bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the item limit (negative means unlimited).
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Shorthand for an unlimited traversal.
    pub fn all() -> Self {
        Self::new().limit(-1)
    }

    /// Yield only entries strictly newer than `id`.
    pub fn gt(mut self, id: EntryId) -> Self {
        self.lower = Some(Bound::Exclusive(id));
        self
    }

    /// Yield entries newer than or equal to `id`.
    pub fn gte(mut self, id: EntryId) -> Self {
        self.lower = Some(Bound::Inclusive(id));
        self
    }

    /// Yield only entries strictly older than `id`.
    pub fn lt(mut self, id: EntryId) -> Self {
        self.upper = Some(Bound::Exclusive(id));
        self
    }

    /// Yield entries older than or equal to `id`.
    pub fn lte(mut self, id: EntryId) -> Self {
        self.upper = Some(Bound::Inclusive(id));
        self
    }
}

/// A single-pass, newest-first cursor over a log snapshot.
pub struct LogIter<'a> {
    log: &'a Log,
    frontier: BinaryHeap<CausalKey>,
    seen: HashSet<EntryId>,
    remaining: u64,
    lower: Option<(EntryId, bool)>,
    stopped: bool,
}

impl Log {
    /// Start an iteration over the current state of the log.
    pub fn iter(&self, options: IterOptions) -> LogIter<'_> {
        let remaining = match options.limit {
            None | Some(0) => 1,
            Some(n) if n < 0 => u64::MAX,
            Some(n) => n as u64,
        };

        let lower = match options.lower {
            Some(Bound::Inclusive(id)) => Some((id, true)),
            Some(Bound::Exclusive(id)) => Some((id, false)),
            None => None,
        };

        let mut iter = LogIter {
            log: self,
            frontier: BinaryHeap::new(),
            seen: HashSet::new(),
            remaining,
            lower,
            stopped: false,
        };

        match options.upper {
            None => {
                for id in self.heads() {
                    iter.enqueue(id);
                }
            }
            Some(Bound::Inclusive(id)) => iter.enqueue(id),
            Some(Bound::Exclusive(id)) => {
                // Start below the bound: seed with its parents.
                iter.seen.insert(id);
                if let Some(entry) = self.get(&id) {
                    for parent in entry.next.clone() {
                        iter.enqueue(parent);
                    }
                }
            }
        }

        iter
    }
}

impl<'a> LogIter<'a> {
    fn enqueue(&mut self, id: EntryId) {
        if self.seen.insert(id) {
            // Referenced-but-absent parents (beyond a truncation tail)
            // simply end the walk on that branch.
            if let Some(entry) = self.log.get(&id) {
                self.frontier.push(CausalKey::with_id(entry, id));
            }
        }
    }
}

impl<'a> Iterator for LogIter<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<&'a Entry> {
        if self.stopped || self.remaining == 0 {
            return None;
        }

        let log = self.log;
        while let Some(key) = self.frontier.pop() {
            let entry = match log.get(&key.id) {
                Some(entry) => entry,
                None => continue,
            };

            if let Some((bound, include)) = self.lower {
                if key.id == bound {
                    self.stopped = true;
                    if include {
                        self.remaining -= 1;
                        return Some(entry);
                    }
                    return None;
                }
            }

            for parent in &entry.next {
                self.enqueue(*parent);
            }

            self.remaining -= 1;
            return Some(entry);
        }

        None
    }
}
