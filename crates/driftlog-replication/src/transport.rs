//! Pub/sub transport abstraction.
//!
//! The replication protocol only needs topic-based broadcast: publish a
//! message on a database address, receive what peers publish there.
//! Delivery is at-least-once and unordered; the protocol assumes nothing
//! stronger. Implementations may sit on gossip meshes, brokers, or (for
//! tests) plain channels.
//!
//! Transports are passed into each database explicitly; there is no
//! process-wide singleton.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::Result;

/// Topic-based broadcast transport.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait PubSub: Send + Sync {
    /// Publish a message to everyone subscribed to `topic`.
    async fn publish(&self, topic: &str, message: Bytes) -> Result<()>;

    /// Subscribe to a topic. Messages arrive on the returned channel
    /// until the subscriber is dropped.
    async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<Bytes>>;
}

/// A simple in-memory pub/sub for testing.
///
/// Every subscriber of a topic receives every message published there,
/// the publisher's own subscriptions included. The replicator tolerates
/// self-delivery because syncing against known heads is a no-op.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    const CHANNEL_CAPACITY: usize = 1000;

    /// In-memory pub/sub hub.
    pub struct MemoryPubSub {
        topics: RwLock<HashMap<String, Vec<mpsc::Sender<Bytes>>>>,
    }

    impl MemoryPubSub {
        /// Create a new hub, shared between peers via `Arc`.
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                topics: RwLock::new(HashMap::new()),
            })
        }
    }

    #[async_trait]
    impl PubSub for MemoryPubSub {
        async fn publish(&self, topic: &str, message: Bytes) -> Result<()> {
            let mut topics = self.topics.write().await;
            if let Some(subscribers) = topics.get_mut(topic) {
                subscribers.retain(|tx| !tx.is_closed());
                for tx in subscribers.iter() {
                    // Ignore errors for broadcast (subscriber may be gone)
                    let _ = tx.send(message.clone()).await;
                }
            }
            Ok(())
        }

        async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<Bytes>> {
            let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
            self.topics
                .write()
                .await
                .entry(topic.to_string())
                .or_default()
                .push(tx);
            Ok(rx)
        }
    }
}
