// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus - Pub/Sub for Synergy Domain Events
//
// Provides in-memory event streaming using tokio broadcast channels.
// Emergence and autogenesis notifications are fire-and-forget: publishing
// never blocks and never fails the detecting code path, regardless of
// subscriber count.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::events::SynergyEvent;

/// Event bus for publishing and subscribing to synergy events
#[derive(Clone)]
pub struct SynergyEventBus {
    sender: Arc<broadcast::Sender<SynergyEvent>>,
}

impl SynergyEventBus {
    /// Create a new event bus with specified channel capacity
    /// Capacity determines how many events can be buffered before dropping old ones
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: SynergyEvent) {
        debug!(event_type = event.event_type(), "Publishing event");

        // send() returns the number of receivers that got the message
        let receiver_count = self.sender.send(event).unwrap_or(0);

        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
    }

    /// Subscribe to all synergy events
    pub fn subscribe(&self) -> EventReceiver {
        let receiver = self.sender.subscribe();
        EventReceiver { receiver }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SynergyEventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Receiver for synergy events
pub struct EventReceiver {
    receiver: broadcast::Receiver<SynergyEvent>,
}

impl EventReceiver {
    /// Receive the next event (blocks until one is available)
    pub async fn recv(&mut self) -> Result<SynergyEvent, EventBusError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => EventBusError::Closed,
            broadcast::error::RecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<SynergyEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

/// Errors that can occur when receiving events
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::network::NetworkId;
    use chrono::Utc;

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = SynergyEventBus::new(10);
        let mut receiver = bus.subscribe();

        let network_id = NetworkId::new();
        bus.publish(SynergyEvent::NetworkCreated {
            network_id,
            name: "test-network".to_string(),
            timestamp: Utc::now(),
        });

        let received = receiver.recv().await.unwrap();
        match received {
            SynergyEvent::NetworkCreated { network_id: id, name, .. } => {
                assert_eq!(id, network_id);
                assert_eq!(name, "test-network");
            }
            _ => panic!("Wrong event type received"),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_does_not_fail() {
        let bus = SynergyEventBus::with_default_capacity();
        assert_eq!(bus.subscriber_count(), 0);

        bus.publish(SynergyEvent::NetworkCreated {
            network_id: NetworkId::new(),
            name: "unwatched".to_string(),
            timestamp: Utc::now(),
        });
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = SynergyEventBus::new(10);
        let mut receiver1 = bus.subscribe();
        let mut receiver2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(SynergyEvent::EmergenceDetected {
            network_id: NetworkId::new(),
            network_name: "test".to_string(),
            synergy_score: 0.75,
            capabilities: Vec::new(),
            timestamp: Utc::now(),
        });

        // Both receivers get the event
        let _ = receiver1.recv().await.unwrap();
        let _ = receiver2.recv().await.unwrap();
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = SynergyEventBus::new(10);
        let mut receiver = bus.subscribe();

        match receiver.try_recv() {
            Err(EventBusError::Empty) => {}
            other => panic!("Expected Empty, got {other:?}"),
        }
    }
}
