//! Access control: who may append to a log.
//!
//! The check is consulted synchronously before any entry is admitted,
//! whether by a local append or by a join of remote entries. A denial is
//! an ordinary outcome (`false`), never a panic or an error escaping the
//! log boundary.

use std::collections::BTreeSet;

use crate::crypto::PublicKey;
use crate::entry::Entry;

/// Capability check consulted before an entry is admitted.
pub trait AccessController: Send + Sync {
    /// Whether `author` may append `entry` to the log.
    fn can_append(&self, author: &PublicKey, entry: &Entry) -> bool;
}

/// Grants write access to everyone.
///
/// The equivalent of a public log with a `*` write rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAccess;

impl AccessController for OpenAccess {
    fn can_append(&self, _author: &PublicKey, _entry: &Entry) -> bool {
        true
    }
}

/// Grants write access to an explicit set of identities.
///
/// The log creator is always a member. Membership changes take effect for
/// subsequent appends and joins only; entries already admitted stay.
#[derive(Debug, Clone)]
pub struct WriteAllowlist {
    writers: BTreeSet<PublicKey>,
}

impl WriteAllowlist {
    /// Create an allowlist containing only the log creator.
    pub fn new(creator: PublicKey) -> Self {
        let mut writers = BTreeSet::new();
        writers.insert(creator);
        Self { writers }
    }

    /// Create an allowlist from an explicit set of writers.
    pub fn from_keys(keys: impl IntoIterator<Item = PublicKey>) -> Self {
        Self {
            writers: keys.into_iter().collect(),
        }
    }

    /// Grant write access to an identity.
    pub fn grant(&mut self, key: PublicKey) {
        self.writers.insert(key);
    }

    /// Revoke write access. Returns whether the key was present.
    pub fn revoke(&mut self, key: &PublicKey) -> bool {
        self.writers.remove(key)
    }

    /// The current set of writers, in key order.
    pub fn writers(&self) -> impl Iterator<Item = &PublicKey> {
        self.writers.iter()
    }
}

impl AccessController for WriteAllowlist {
    fn can_append(&self, author: &PublicKey, _entry: &Entry) -> bool {
        self.writers.contains(author)
    }
}
