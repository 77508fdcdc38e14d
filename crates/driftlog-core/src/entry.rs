//! Entry: the immutable unit of the log.
//!
//! An entry is a signed record linking back to its parent entries by
//! content id. Once signed and hashed it cannot be edited; new state is
//! always expressed as new entries.

use bytes::Bytes;

use crate::canonical::{canonical_bytes, signing_bytes};
use crate::clock::LamportClock;
use crate::crypto::{Keypair, PublicKey, Signature};
use crate::error::ValidationError;
use crate::id::EntryId;

/// The current entry schema version.
pub const ENTRY_VERSION: u8 = 0;

/// Maximum number of parent refs allowed in an entry.
pub const MAX_NEXT: usize = 128;

/// A complete log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Schema version (currently 0).
    pub version: u8,

    /// The owning log's address; shared by all entries of one log.
    pub log_id: String,

    /// The author's public key.
    pub author: PublicKey,

    /// Logical clock; `clock.id` must equal `author`.
    pub clock: LamportClock,

    /// Parent entry ids, sorted and unique. Empty for a root entry, one
    /// for a plain append, several for a merge entry.
    pub next: Vec<EntryId>,

    /// Opaque application payload.
    pub payload: Bytes,

    /// Ed25519 signature over the canonical bytes excluding this field.
    pub signature: Signature,
}

impl Entry {
    /// Compute the content id (Blake3 of the canonical bytes, signature
    /// included).
    pub fn id(&self) -> EntryId {
        EntryId::hash(&canonical_bytes(self))
    }

    /// Logical time of this entry.
    pub fn time(&self) -> u64 {
        self.clock.time
    }

    /// Whether this entry starts a log (no parents).
    pub fn is_root(&self) -> bool {
        self.next.is_empty()
    }

    /// Verify the signature against the author key.
    pub fn verify(&self) -> Result<(), ValidationError> {
        let message = signing_bytes(self);
        self.author
            .verify(&message, &self.signature)
            .map_err(|_| ValidationError::SignatureFailed)
    }
}

/// Builder for creating signed entries.
///
/// The builder does not compute causal state: the caller supplies the
/// parent set and the resulting clock time (one greater than the maximum
/// parent time). [`crate::log::Log::append`] does this for local writes.
pub struct EntryBuilder {
    log_id: String,
    time: u64,
    next: Vec<EntryId>,
    payload: Bytes,
}

impl EntryBuilder {
    /// Start building an entry for the given log.
    pub fn new(log_id: impl Into<String>) -> Self {
        Self {
            log_id: log_id.into(),
            time: 0,
            next: Vec::new(),
            payload: Bytes::new(),
        }
    }

    /// Set the clock time.
    pub fn time(mut self, time: u64) -> Self {
        self.time = time;
        self
    }

    /// Add a parent ref.
    pub fn parent(mut self, id: EntryId) -> Self {
        self.next.push(id);
        self
    }

    /// Set the full parent set.
    pub fn parents(mut self, ids: impl IntoIterator<Item = EntryId>) -> Self {
        self.next = ids.into_iter().collect();
        self
    }

    /// Set the payload.
    pub fn payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Normalize the parent set, then build and sign the entry.
    pub fn sign(mut self, keypair: &Keypair) -> Entry {
        self.next.sort_unstable();
        self.next.dedup();

        let author = keypair.public_key();
        let mut entry = Entry {
            version: ENTRY_VERSION,
            log_id: self.log_id,
            author,
            clock: LamportClock::with_time(author, self.time),
            next: self.next,
            payload: self.payload,
            signature: Signature::ZERO,
        };
        entry.signature = keypair.sign(&signing_bytes(&entry));
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_signs_verifiable_entry() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let entry = EntryBuilder::new("log")
            .payload(b"hello".to_vec())
            .sign(&keypair);

        assert_eq!(entry.version, ENTRY_VERSION);
        assert!(entry.is_root());
        assert_eq!(entry.time(), 0);
        assert_eq!(entry.author, keypair.public_key());
        entry.verify().expect("fresh entry must verify");
    }

    #[test]
    fn test_builder_sorts_and_dedups_parents() {
        let keypair = Keypair::generate();
        let a = EntryId::from_bytes([0xaa; 32]);
        let b = EntryId::from_bytes([0xbb; 32]);

        let entry = EntryBuilder::new("log")
            .time(1)
            .parents([b, a, b])
            .payload(b"x".to_vec())
            .sign(&keypair);

        assert_eq!(entry.next, vec![a, b]);
    }

    #[test]
    fn test_id_deterministic() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let entry = EntryBuilder::new("log")
            .payload(b"hello".to_vec())
            .sign(&keypair);

        assert_eq!(entry.id(), entry.id());
    }

    #[test]
    fn test_id_changes_with_content() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let e1 = EntryBuilder::new("log")
            .payload(b"one".to_vec())
            .sign(&keypair);
        let e2 = EntryBuilder::new("log")
            .payload(b"two".to_vec())
            .sign(&keypair);

        assert_ne!(e1.id(), e2.id());
    }

    #[test]
    fn test_tampered_entry_fails_verify() {
        let keypair = Keypair::generate();
        let mut entry = EntryBuilder::new("log")
            .payload(b"hello".to_vec())
            .sign(&keypair);

        entry.payload = Bytes::from_static(b"tampered");
        assert!(entry.verify().is_err());
    }
}
