//! Replication protocol messages.
//!
//! The protocol has a single message: a head announcement. Everything
//! else (entry bodies, history) moves through the block store, so peers
//! only ever gossip "here is where my log currently ends".

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use driftlog_core::EntryId;

use crate::error::{ReplicationError, Result};

/// Maximum heads carried in one announcement.
pub const MAX_ANNOUNCED_HEADS: usize = 1000;

/// Broadcast after a local append or merge: the database address and its
/// current head ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadAnnouncement {
    /// The database address, which is also the pub/sub topic.
    pub address: String,
    /// Current head entry ids.
    pub heads: Vec<EntryId>,
}

impl HeadAnnouncement {
    /// Create an announcement.
    pub fn new(address: impl Into<String>, heads: Vec<EntryId>) -> Self {
        Self {
            address: address.into(),
            heads,
        }
    }

    /// Check protocol limits.
    pub fn validate_limits(&self) -> Result<()> {
        if self.heads.len() > MAX_ANNOUNCED_HEADS {
            return Err(ReplicationError::InvalidMessage(format!(
                "too many heads: {}",
                self.heads.len()
            )));
        }
        Ok(())
    }

    /// Encode for the wire.
    pub fn to_bytes(&self) -> Result<Bytes> {
        self.validate_limits()?;
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| ReplicationError::Codec(e.to_string()))?;
        Ok(buf.into())
    }

    /// Decode from the wire.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let announcement: Self =
            ciborium::from_reader(bytes).map_err(|e| ReplicationError::Codec(e.to_string()))?;
        announcement.validate_limits()?;
        Ok(announcement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_announcement_roundtrip() {
        let announcement = HeadAnnouncement::new(
            "/driftlog/test",
            vec![EntryId::from_bytes([0x01; 32]), EntryId::from_bytes([0x02; 32])],
        );

        let bytes = announcement.to_bytes().unwrap();
        let decoded = HeadAnnouncement::from_bytes(&bytes).unwrap();
        assert_eq!(announcement, decoded);
    }

    #[test]
    fn test_empty_heads_are_fine() {
        let announcement = HeadAnnouncement::new("/driftlog/test", vec![]);
        let bytes = announcement.to_bytes().unwrap();
        assert!(HeadAnnouncement::from_bytes(&bytes).is_ok());
    }

    #[test]
    fn test_limits_enforced() {
        let heads = vec![EntryId::ZERO; MAX_ANNOUNCED_HEADS + 1];
        let announcement = HeadAnnouncement::new("/driftlog/test", heads);
        assert!(matches!(
            announcement.to_bytes(),
            Err(ReplicationError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(HeadAnnouncement::from_bytes(b"nonsense").is_err());
    }
}
