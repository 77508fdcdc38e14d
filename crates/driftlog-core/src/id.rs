//! Content identifiers for log entries.
//!
//! An [`EntryId`] is the Blake3 hash of an entry's canonical bytes. It is
//! the only name an entry has: two entries with the same content have the
//! same id, and any mutation produces a different id.
//!
//! Externally, ids render as CIDv1 strings: multibase base32-lower (`b`
//! prefix) over the bytes `0x01` (cidv1) `0x71` (dag-cbor) `0x1e`
//! (blake3) `0x20` (32-byte digest) followed by the hash. Every id in a
//! deployment is therefore a 59-character string starting with `ba`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// CIDv1 header: version, dag-cbor codec, blake3 multihash, digest length.
const CID_HEADER: [u8; 4] = [0x01, 0x71, 0x1e, 0x20];

/// Length of the string form: 'b' + base32(36 bytes).
pub const CID_STRING_LEN: usize = 59;

/// A 32-byte content identifier, computed as Blake3(canonical_bytes(entry)).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub [u8; 32]);

impl EntryId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hash arbitrary bytes into an id.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|e| CoreError::MalformedId(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::MalformedId("expected 32 bytes".into()))?;
        Ok(Self(arr))
    }

    /// Render as a CIDv1 string (`ba…`, 59 characters).
    pub fn to_cid(&self) -> String {
        let mut cid_bytes = Vec::with_capacity(36);
        cid_bytes.extend_from_slice(&CID_HEADER);
        cid_bytes.extend_from_slice(&self.0);
        format!("b{}", base32_encode(&cid_bytes))
    }

    /// Parse a CIDv1 string produced by [`EntryId::to_cid`].
    pub fn from_cid(s: &str) -> Result<Self, CoreError> {
        let rest = s
            .strip_prefix('b')
            .ok_or_else(|| CoreError::MalformedId("missing multibase prefix".into()))?;
        let bytes = base32_decode(rest)
            .ok_or_else(|| CoreError::MalformedId("invalid base32".into()))?;
        if bytes.len() != 36 || bytes[..4] != CID_HEADER {
            return Err(CoreError::MalformedId("unexpected cid header".into()));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes[4..]);
        Ok(Self(arr))
    }

    /// The zero id (used as a sentinel).
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_cid())
    }
}

impl AsRef<[u8]> for EntryId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for EntryId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

const BASE32_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz234567";

// RFC 4648 base32 encoding (lowercase, no padding).
fn base32_encode(data: &[u8]) -> String {
    let mut result = String::new();
    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;

    for &byte in data {
        buffer = (buffer << 8) | (byte as u64);
        bits_in_buffer += 8;

        while bits_in_buffer >= 5 {
            bits_in_buffer -= 5;
            let index = ((buffer >> bits_in_buffer) & 0x1f) as usize;
            result.push(BASE32_ALPHABET[index] as char);
        }
    }

    if bits_in_buffer > 0 {
        let index = ((buffer << (5 - bits_in_buffer)) & 0x1f) as usize;
        result.push(BASE32_ALPHABET[index] as char);
    }

    result
}

fn base32_decode(s: &str) -> Option<Vec<u8>> {
    let mut result = Vec::with_capacity(s.len() * 5 / 8);
    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;

    for c in s.bytes() {
        let value = BASE32_ALPHABET.iter().position(|&a| a == c)? as u64;
        buffer = (buffer << 5) | value;
        bits_in_buffer += 5;

        if bits_in_buffer >= 8 {
            bits_in_buffer -= 8;
            result.push(((buffer >> bits_in_buffer) & 0xff) as u8);
        }
    }

    Some(result)
}
