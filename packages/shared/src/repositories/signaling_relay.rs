use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::warn;

use crate::models::signaling::SignalEnvelope;
use crate::repositories::connection_repository::ConnectionRepository;

const ROOM_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug)]
pub enum SignalingRelayError {
    Subscribe(String),
    Publish(String),
}

impl std::fmt::Display for SignalingRelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalingRelayError::Subscribe(msg) => write!(f, "Subscribe error: {}", msg),
            SignalingRelayError::Publish(msg) => write!(f, "Publish error: {}", msg),
        }
    }
}

impl std::error::Error for SignalingRelayError {}

/// Publish half of the relay seam. Delivery is at-least-once to whoever is
/// currently subscribed; there is no ordering guarantee across subscribers
/// and nothing is persisted.
#[async_trait]
pub trait SignalPublisher: Send + Sync {
    async fn publish(
        &self,
        room_id: &str,
        envelope: &SignalEnvelope,
    ) -> Result<(), SignalingRelayError>;
}

/// Full relay seam: publish plus a per-room subscription stream. Used by the
/// peer negotiator; the production fan-out path only needs [`SignalPublisher`].
#[async_trait]
pub trait SignalingRelay: SignalPublisher {
    async fn subscribe(
        &self,
        room_id: &str,
    ) -> Result<broadcast::Receiver<SignalEnvelope>, SignalingRelayError>;
}

/// Process-local relay: one broadcast channel per room id. Backs the
/// negotiator test harness and any single-instance deployment.
#[derive(Default)]
pub struct InMemoryRelay {
    channels: Mutex<HashMap<String, broadcast::Sender<SignalEnvelope>>>,
}

impl InMemoryRelay {
    pub fn new() -> Self {
        InMemoryRelay {
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn sender_for(&self, room_id: &str) -> broadcast::Sender<SignalEnvelope> {
        let mut channels = self.channels.lock().expect("relay channel map poisoned");
        channels
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl SignalPublisher for InMemoryRelay {
    async fn publish(
        &self,
        room_id: &str,
        envelope: &SignalEnvelope,
    ) -> Result<(), SignalingRelayError> {
        // A send error only means nobody is subscribed yet, which is a legal
        // relay state (both sides may publish HELLO before subscribing).
        let _ = self.sender_for(room_id).send(envelope.clone());
        Ok(())
    }
}

#[async_trait]
impl SignalingRelay for InMemoryRelay {
    async fn subscribe(
        &self,
        room_id: &str,
    ) -> Result<broadcast::Receiver<SignalEnvelope>, SignalingRelayError> {
        Ok(self.sender_for(room_id).subscribe())
    }
}

/// Production publish path: serializes the envelope and posts it to every
/// live connection in the room except the sender's own. Failed deliveries are
/// logged and skipped; the relay promises at-least-once to connected
/// subscribers, nothing more.
pub struct ConnectionFanoutPublisher {
    connections: Arc<dyn ConnectionRepository>,
}

impl ConnectionFanoutPublisher {
    pub fn new(connections: Arc<dyn ConnectionRepository>) -> Self {
        Self { connections }
    }
}

#[async_trait]
impl SignalPublisher for ConnectionFanoutPublisher {
    async fn publish(
        &self,
        room_id: &str,
        envelope: &SignalEnvelope,
    ) -> Result<(), SignalingRelayError> {
        let payload = serde_json::to_string(envelope)
            .map_err(|e| SignalingRelayError::Publish(e.to_string()))?;

        let connections = self
            .connections
            .connections_for_room(room_id)
            .await
            .map_err(|e| SignalingRelayError::Publish(e.to_string()))?;

        for connection in connections {
            if connection.user_id == envelope.sender_id() {
                continue;
            }
            if let Err(e) = self
                .connections
                .send_message(&connection.connection_id, &payload)
                .await
            {
                warn!(
                    "Failed to deliver signal to connection {} in room {}: {}",
                    connection.connection_id, room_id, e
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::signaling::SignalEnvelope;

    #[tokio::test]
    async fn publish_reaches_all_other_subscribers_of_the_same_room() {
        let relay = InMemoryRelay::new();
        let mut first = relay.subscribe("room-1").await.unwrap();
        let mut second = relay.subscribe("room-1").await.unwrap();

        let envelope = SignalEnvelope::Hello {
            sender_id: "user-a".to_string(),
        };
        relay.publish("room-1", &envelope).await.unwrap();

        assert_eq!(first.recv().await.unwrap(), envelope);
        assert_eq!(second.recv().await.unwrap(), envelope);
    }

    #[tokio::test]
    async fn subscribers_of_a_different_room_never_observe_the_envelope() {
        let relay = InMemoryRelay::new();
        let mut other_room = relay.subscribe("room-2").await.unwrap();

        relay
            .publish(
                "room-1",
                &SignalEnvelope::Hello {
                    sender_id: "user-a".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            other_room.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_not_an_error() {
        let relay = InMemoryRelay::new();
        relay
            .publish(
                "empty-room",
                &SignalEnvelope::Hello {
                    sender_id: "user-a".to_string(),
                },
            )
            .await
            .unwrap();
    }
}
