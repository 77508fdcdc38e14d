//! # driftlog-core
//!
//! Pure primitives for driftlog: signed entries, Lamport clocks, the log
//! DAG with deterministic merge, and the range-aware reverse iterator.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over cryptographic data structures; persistence and
//! replication live in `driftlog-store` and `driftlog-replication`.
//!
//! ## Key Types
//!
//! - [`Entry`] - The immutable, signed unit of the log
//! - [`EntryId`] - Content-addressed identifier (Blake3 hash)
//! - [`Log`] - A local replica of the entry DAG: append, join, truncate
//! - [`LogIter`] / [`IterOptions`] - Newest-first range iteration
//! - [`LamportClock`] - Logical time for causal ordering
//! - [`AccessController`] - Capability check consulted on every append
//!
//! ## Canonicalization
//!
//! Entries are encoded as deterministic CBOR so the same entry hashes to
//! the same id everywhere. See [`canonical`].

pub mod access;
pub mod canonical;
pub mod clock;
pub mod crypto;
pub mod entry;
pub mod error;
pub mod id;
pub mod iter;
pub mod log;
pub mod order;
pub mod validation;

pub use access::{AccessController, OpenAccess, WriteAllowlist};
pub use canonical::{canonical_bytes, decode_entry, signing_bytes};
pub use clock::LamportClock;
pub use crypto::{Keypair, PublicKey, Signature};
pub use entry::{Entry, EntryBuilder, ENTRY_VERSION, MAX_NEXT};
pub use error::{AppendError, CoreError, ValidationError};
pub use id::{EntryId, CID_STRING_LEN};
pub use iter::{Bound, IterOptions, LogIter};
pub use log::{DropReason, JoinOutcome, Log};
pub use order::causal_cmp;
pub use validation::{validate_entry, validate_entry_structure};
