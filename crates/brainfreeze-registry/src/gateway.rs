//! The broadcast gateway: the only writer to client connections.
//!
//! Lobbies and sessions never hold connection handles. They hold ids and
//! ask the gateway to deliver. The gateway encodes a message once and
//! pushes the same bytes into every recipient's outbound channel, so all
//! recipients of one event see identical content.

use std::sync::Arc;

use brainfreeze_protocol::{Codec, ConnectionId, JsonCodec, ServerMessage};

use crate::{Frame, Registry};

/// Delivers [`ServerMessage`]s to connections by id.
///
/// Cheap to clone: it is a pair of `Arc`s.
#[derive(Clone)]
pub struct Gateway {
    registry: Arc<Registry>,
    codec: Arc<JsonCodec>,
}

impl Gateway {
    /// Creates a gateway that resolves ids through `registry`.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            codec: Arc::new(JsonCodec),
        }
    }

    /// The registry this gateway delivers through.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Sends one message to one connection.
    ///
    /// Best-effort: an unknown or closed connection is a silent no-op.
    pub async fn send(&self, id: ConnectionId, msg: &ServerMessage) {
        self.broadcast(&[id], msg).await;
    }

    /// Sends one message to several connections.
    ///
    /// The message is encoded once and the same frame is reused for every
    /// recipient. Unknown or closed connections are skipped.
    pub async fn broadcast(&self, ids: &[ConnectionId], msg: &ServerMessage) {
        if ids.is_empty() {
            return;
        }
        let Some(frame) = self.encode(msg) else {
            return;
        };
        let mut delivered = 0usize;
        self.registry
            .with_senders(ids, |_, sender| {
                if sender.send(Arc::clone(&frame)).is_ok() {
                    delivered += 1;
                }
            })
            .await;
        tracing::trace!(recipients = ids.len(), delivered, ?msg, "broadcast");
    }

    fn encode(&self, msg: &ServerMessage) -> Option<Frame> {
        match self.codec.encode(msg) {
            Ok(bytes) => Some(Frame::from(bytes)),
            Err(e) => {
                tracing::warn!(error = %e, ?msg, "failed to encode server message");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn text(frame: &Frame) -> &str {
        std::str::from_utf8(frame).unwrap()
    }

    #[tokio::test]
    async fn test_broadcast_shares_one_encoded_frame() {
        let registry = Arc::new(Registry::new());
        let gateway = Gateway::new(Arc::clone(&registry));
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let a = registry.register(tx_a).await;
        let b = registry.register(tx_b).await;

        gateway
            .broadcast(&[a, b], &ServerMessage::UpdateUsers { player_count: 2 })
            .await;

        let fa = rx_a.try_recv().unwrap();
        let fb = rx_b.try_recv().unwrap();
        assert!(Arc::ptr_eq(&fa, &fb), "one encode per broadcast");
        assert_eq!(text(&fa), r#"{"type":"update_users","playerCount":2}"#);
    }

    #[tokio::test]
    async fn test_send_to_unknown_connection_is_noop() {
        let registry = Arc::new(Registry::new());
        let gateway = Gateway::new(registry);
        gateway.send(ConnectionId(404), &ServerMessage::GameLost).await;
    }

    #[tokio::test]
    async fn test_send_to_closed_receiver_is_noop() {
        let registry = Arc::new(Registry::new());
        let gateway = Gateway::new(Arc::clone(&registry));
        let (tx, rx) = mpsc::unbounded_channel();
        let a = registry.register(tx).await;
        drop(rx);

        gateway.send(a, &ServerMessage::GameLost).await;
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_broadcast_skips_removed_connection() {
        let registry = Arc::new(Registry::new());
        let gateway = Gateway::new(Arc::clone(&registry));
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let a = registry.register(tx_a).await;
        let b = registry.register(tx_b).await;
        registry.remove(b).await;

        gateway.broadcast(&[a, b], &ServerMessage::CountdownCancelled).await;

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }
}
