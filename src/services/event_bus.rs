//! EventBus for progress streaming.
//!
//! Broadcast-based and sequence-numbered. Publishing never blocks and never
//! fails: with no subscribers the event is dropped, and a receiver that falls
//! behind by more than the channel capacity loses the oldest events
//! (`RecvError::Lagged`) without affecting anyone else.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

use crate::domain::models::{EventKind, HunterEvent};
use crate::domain::ports::EventSink;

/// Configuration for the EventBus.
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Channel capacity for the broadcast channel.
    pub channel_capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// Central event bus for broadcasting events to multiple consumers.
pub struct EventBus {
    sender: broadcast::Sender<HunterEvent>,
    sequence: AtomicU64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

impl EventBus {
    /// Bus with the given channel capacity (at least 1).
    pub fn new(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            sequence: AtomicU64::new(0),
        }
    }

    /// Wrap `kind` in an envelope and broadcast it. Returns the envelope.
    pub fn emit(&self, kind: EventKind) -> HunterEvent {
        let event = HunterEvent {
            id: Uuid::new_v4(),
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            timestamp: Utc::now(),
            kind,
        };

        // Err only means nobody is listening
        if self.sender.send(event.clone()).is_err() {
            trace!(event_type = event.event_type(), "event dropped, no subscribers");
        }
        event
    }

    /// New receiver for events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<HunterEvent> {
        self.sender.subscribe()
    }

    /// Sequence number the next event will get.
    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Number of live receivers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventSink for EventBus {
    fn publish(&self, kind: EventKind) {
        self.emit(kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::RecvError;

    #[tokio::test]
    async fn test_sequence_assignment() {
        let bus = EventBus::default();
        assert_eq!(bus.current_sequence(), 0);

        let mut rx = bus.subscribe();
        bus.publish(EventKind::MarketResearchStarted);
        bus.publish(EventKind::agent_error("research", "boom"));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.sequence, 0);
        assert_eq!(second.sequence, 1);
        assert_eq!(second.event_type(), "agent_error");
        assert_eq!(bus.current_sequence(), 2);
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let bus = EventBus::default();
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(EventKind::MarketResearchStarted);
        assert_eq!(bus.current_sequence(), 1);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_each_receive() {
        let bus = EventBus::default();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(EventKind::StrategyStored {
            version: 3,
            evolved_from: Some(2),
        });
        assert_eq!(a.recv().await.unwrap().event_type(), "strategy_stored");
        assert_eq!(b.recv().await.unwrap().event_type(), "strategy_stored");
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_pruned() {
        let bus = EventBus::default();
        let mut kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(EventKind::MarketResearchStarted);
        assert!(kept.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags_without_blocking() {
        let bus = EventBus::new(EventBusConfig { channel_capacity: 2 });
        let mut slow = bus.subscribe();

        for _ in 0..5 {
            bus.publish(EventKind::MarketResearchStarted);
        }

        assert!(matches!(slow.recv().await, Err(RecvError::Lagged(3))));
        assert_eq!(slow.recv().await.unwrap().sequence, 3);
    }
}
