//! Deterministic total order over the log's partial order.
//!
//! The log is a DAG, so causality alone gives only a partial order.
//! Presentation and iteration need a strict total order that every
//! replica computes identically over the same entry set:
//!
//! 1. `clock.time` — higher is newer;
//! 2. `clock.id` (author key bytes) — breaks ties between concurrent
//!    writes;
//! 3. entry id bytes — breaks ties between entries by the same author at
//!    the same time.
//!
//! Because an entry's time is strictly greater than each parent's, this
//! order is a linear extension of causality: children always sort newer
//! than their ancestors.

use std::cmp::Ordering;

use crate::crypto::PublicKey;
use crate::entry::Entry;
use crate::id::EntryId;

/// Compare two entries; `Greater` means `a` is newer than `b`.
pub fn causal_cmp(a: &Entry, b: &Entry) -> Ordering {
    CausalKey::of(a).cmp(&CausalKey::of(b))
}

/// The sort key behind [`causal_cmp`].
///
/// Field order matters: the derived `Ord` compares time, then author,
/// then id. A max-heap of these keys pops entries newest-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct CausalKey {
    pub time: u64,
    pub author: PublicKey,
    pub id: EntryId,
}

impl CausalKey {
    pub fn of(entry: &Entry) -> Self {
        Self {
            time: entry.clock.time,
            author: entry.author,
            id: entry.id(),
        }
    }

    pub fn with_id(entry: &Entry, id: EntryId) -> Self {
        Self {
            time: entry.clock.time,
            author: entry.author,
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::entry::EntryBuilder;

    #[test]
    fn test_time_dominates() {
        let kp = Keypair::from_seed(&[0x01; 32]);
        let older = EntryBuilder::new("log").payload(b"a".to_vec()).sign(&kp);
        let newer = EntryBuilder::new("log")
            .time(1)
            .parent(older.id())
            .payload(b"b".to_vec())
            .sign(&kp);

        assert_eq!(causal_cmp(&newer, &older), Ordering::Greater);
        assert_eq!(causal_cmp(&older, &newer), Ordering::Less);
    }

    #[test]
    fn test_concurrent_ties_break_on_author() {
        let kp_a = Keypair::from_seed(&[0x01; 32]);
        let kp_b = Keypair::from_seed(&[0x02; 32]);
        let a = EntryBuilder::new("log").payload(b"a".to_vec()).sign(&kp_a);
        let b = EntryBuilder::new("log").payload(b"b".to_vec()).sign(&kp_b);

        let expected = kp_a.public_key().cmp(&kp_b.public_key());
        assert_eq!(causal_cmp(&a, &b), expected);
        assert_eq!(causal_cmp(&b, &a), expected.reverse());
    }

    #[test]
    fn test_same_author_same_time_breaks_on_hash() {
        let kp = Keypair::from_seed(&[0x01; 32]);
        let a = EntryBuilder::new("log").payload(b"a".to_vec()).sign(&kp);
        let b = EntryBuilder::new("log").payload(b"b".to_vec()).sign(&kp);

        assert_ne!(causal_cmp(&a, &b), Ordering::Equal);
        assert_eq!(causal_cmp(&a, &b), a.id().cmp(&b.id()));
    }

    #[test]
    fn test_total_order_is_strict() {
        let kp = Keypair::from_seed(&[0x01; 32]);
        let entry = EntryBuilder::new("log").payload(b"a".to_vec()).sign(&kp);
        assert_eq!(causal_cmp(&entry, &entry), Ordering::Equal);
    }
}
