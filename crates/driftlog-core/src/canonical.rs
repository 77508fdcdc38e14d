//! Canonical CBOR encoding for deterministic serialization.
//!
//! Implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats
//!
//! The canonical encoding is what makes content addressing work: the same
//! entry produces identical bytes, and thus an identical id, on every
//! platform and every replica.

use ciborium::value::Value;

use crate::clock::LamportClock;
use crate::crypto::{PublicKey, Signature};
use crate::entry::Entry;
use crate::error::CoreError;
use crate::id::EntryId;

/// Entry field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const VERSION: u64 = 0;
    pub const LOG_ID: u64 = 1;
    pub const AUTHOR: u64 = 2;
    pub const CLOCK_TIME: u64 = 3;
    pub const NEXT: u64 = 4;
    pub const PAYLOAD: u64 = 5;
    pub const SIGNATURE: u64 = 6;
}

/// Encode the signed portion of an entry (everything but the signature).
///
/// This is the message the author signs.
pub fn signing_bytes(entry: &Entry) -> Vec<u8> {
    let value = entry_to_cbor_value(entry, false);
    encode_cbor_value_canonical(&value)
}

/// Encode an entire entry, signature included.
///
/// The entry's content id is Blake3 over these bytes, and these are the
/// bytes handed to the block store.
pub fn canonical_bytes(entry: &Entry) -> Vec<u8> {
    let value = entry_to_cbor_value(entry, true);
    encode_cbor_value_canonical(&value)
}

/// Convert an entry to a CBOR Value (map with integer keys).
fn entry_to_cbor_value(entry: &Entry, with_signature: bool) -> Value {
    let mut entries = Vec::with_capacity(7);

    entries.push((
        Value::Integer(keys::VERSION.into()),
        Value::Integer(entry.version.into()),
    ));

    entries.push((
        Value::Integer(keys::LOG_ID.into()),
        Value::Text(entry.log_id.clone()),
    ));

    entries.push((
        Value::Integer(keys::AUTHOR.into()),
        Value::Bytes(entry.author.0.to_vec()),
    ));

    entries.push((
        Value::Integer(keys::CLOCK_TIME.into()),
        Value::Integer(entry.clock.time.into()),
    ));

    let next_array: Vec<Value> = entry
        .next
        .iter()
        .map(|id| Value::Bytes(id.0.to_vec()))
        .collect();
    entries.push((Value::Integer(keys::NEXT.into()), Value::Array(next_array)));

    entries.push((
        Value::Integer(keys::PAYLOAD.into()),
        Value::Bytes(entry.payload.to_vec()),
    ));

    if with_signature {
        entries.push((
            Value::Integer(keys::SIGNATURE.into()),
            Value::Bytes(entry.signature.0.to_vec()),
        ));
    }

    Value::Map(entries)
}

/// Encode a CBOR Value to canonical bytes.
fn encode_cbor_value_canonical(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr),
        Value::Map(entries) => encode_map_canonical(buf, entries),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(_) => panic!("floats not supported in canonical encoding"),
        _ => panic!("unsupported CBOR value type"),
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n = i128::from(i);

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode an array (major type 4).
fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item);
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut key_value_pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);

    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}

/// Decode an entry from canonical bytes.
pub fn decode_entry(bytes: &[u8]) -> Result<Entry, CoreError> {
    let cursor = std::io::Cursor::new(bytes);
    let value: Value =
        ciborium::from_reader(cursor).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    let map = match &value {
        Value::Map(m) => m,
        _ => return Err(CoreError::MalformedEntry("expected map".into())),
    };

    let get = |key: u64| -> Option<&Value> {
        map.iter()
            .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == key as i128))
            .map(|(_, v)| v)
    };

    let version = match get(keys::VERSION) {
        Some(Value::Integer(i)) => i128::from(*i) as u8,
        _ => return Err(CoreError::MalformedEntry("missing version".into())),
    };

    let log_id = match get(keys::LOG_ID) {
        Some(Value::Text(s)) => s.clone(),
        _ => return Err(CoreError::MalformedEntry("invalid log_id".into())),
    };

    let author = match get(keys::AUTHOR) {
        Some(Value::Bytes(b)) if b.len() == 32 => {
            let mut arr = [0u8; 32];
            arr.copy_from_slice(b);
            PublicKey(arr)
        }
        _ => return Err(CoreError::MalformedEntry("invalid author".into())),
    };

    let time = match get(keys::CLOCK_TIME) {
        Some(Value::Integer(i)) => {
            let n = i128::from(*i);
            if n < 0 {
                return Err(CoreError::MalformedEntry("negative clock time".into()));
            }
            n as u64
        }
        _ => return Err(CoreError::MalformedEntry("missing clock time".into())),
    };

    let next = match get(keys::NEXT) {
        Some(Value::Array(arr)) => {
            let mut next = Vec::with_capacity(arr.len());
            for item in arr {
                match item {
                    Value::Bytes(b) if b.len() == 32 => {
                        let mut arr = [0u8; 32];
                        arr.copy_from_slice(b);
                        next.push(EntryId(arr));
                    }
                    _ => return Err(CoreError::MalformedEntry("invalid parent ref".into())),
                }
            }
            next
        }
        None => Vec::new(),
        _ => return Err(CoreError::MalformedEntry("invalid next".into())),
    };

    let payload = match get(keys::PAYLOAD) {
        Some(Value::Bytes(b)) => b.clone(),
        _ => return Err(CoreError::MalformedEntry("missing payload".into())),
    };

    let signature = match get(keys::SIGNATURE) {
        Some(Value::Bytes(b)) if b.len() == 64 => {
            let mut arr = [0u8; 64];
            arr.copy_from_slice(b);
            Signature(arr)
        }
        _ => return Err(CoreError::MalformedEntry("invalid signature".into())),
    };

    Ok(Entry {
        version,
        log_id,
        author,
        clock: LamportClock::with_time(author, time),
        next,
        payload: payload.into(),
        signature,
    })
}
