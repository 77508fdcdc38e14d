//! Lamport clocks: the logical time carried by every entry.
//!
//! A clock pairs an author identity with a monotonic counter. Causality is
//! enforced structurally: an entry's time is strictly greater than each of
//! its parents'. Comparing clocks compares `time` first and breaks ties on
//! the author key, which gives concurrent writes a deterministic order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::crypto::PublicKey;

/// A logical clock `{id, time}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LamportClock {
    /// The author this clock belongs to.
    pub id: PublicKey,
    /// Monotonic counter; 0 for a root entry.
    pub time: u64,
}

impl LamportClock {
    /// Create a clock at time 0.
    pub fn new(id: PublicKey) -> Self {
        Self { id, time: 0 }
    }

    /// Create a clock at a given time.
    pub fn with_time(id: PublicKey, time: u64) -> Self {
        Self { id, time }
    }

    /// Advance by one and return the new time.
    pub fn tick(&mut self) -> u64 {
        self.time += 1;
        self.time
    }

    /// Merge another clock's time: local time becomes the max of the two.
    pub fn merge(&mut self, time: u64) {
        if time > self.time {
            self.time = time;
        }
    }
}

impl PartialOrd for LamportClock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LamportClock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> PublicKey {
        PublicKey::from_bytes([byte; 32])
    }

    #[test]
    fn test_tick_advances() {
        let mut clock = LamportClock::new(key(1));
        assert_eq!(clock.time, 0);
        assert_eq!(clock.tick(), 1);
        assert_eq!(clock.tick(), 2);
    }

    #[test]
    fn test_merge_takes_max() {
        let mut clock = LamportClock::with_time(key(1), 3);
        clock.merge(7);
        assert_eq!(clock.time, 7);
        clock.merge(2);
        assert_eq!(clock.time, 7);
    }

    #[test]
    fn test_ordering_by_time_then_id() {
        let a = LamportClock::with_time(key(1), 5);
        let b = LamportClock::with_time(key(2), 5);
        let c = LamportClock::with_time(key(1), 6);

        assert!(a < b, "equal time breaks ties on id");
        assert!(b < c, "time dominates id");
    }
}
