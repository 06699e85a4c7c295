// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Gang Admission Events
//
// Provides in-memory event streaming using tokio broadcast channels.
// Feeds the CLI simulator, tests and any observer the embedder attaches.
// In-memory only: events are lost on restart.

use crate::domain::events::GangEvent;
use crate::domain::group::GroupKey;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Event bus for publishing and subscribing to gang events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<GangEvent>>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    /// Capacity determines how many events can be buffered before dropping old ones
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: GangEvent) {
        debug!("Publishing event: {:?}", event);

        // send() only fails when nobody is subscribed
        if self.sender.send(event).is_err() {
            debug!("No subscribers listening to event");
        }
    }

    /// Subscribe to all gang events
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe to the events of a single group
    pub fn subscribe_group(&self, group: GroupKey) -> GroupEventReceiver {
        GroupEventReceiver {
            receiver: self.sender.subscribe(),
            group,
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

/// Receiver for all gang events
pub struct EventReceiver {
    receiver: broadcast::Receiver<GangEvent>,
}

impl EventReceiver {
    /// Receive the next event (waits until one is available)
    pub async fn recv(&mut self) -> Result<GangEvent, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<GangEvent, EventBusError> {
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

/// Receiver for one group's events (filtered)
pub struct GroupEventReceiver {
    receiver: broadcast::Receiver<GangEvent>,
    group: GroupKey,
}

impl GroupEventReceiver {
    /// Receive the next event for the subscribed group
    pub async fn recv(&mut self) -> Result<GangEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(map_recv_error)?;
            if event.group() == &self.group {
                return Ok(event);
            }
        }
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
    use crate::domain::group::Quorum;
    use chrono::Utc;

    fn created(group: &str) -> GangEvent {
        GangEvent::GroupCreated {
            group: group.into(),
            quorum: Quorum::new(2).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        event_bus.publish(created("default/g1"));

        match receiver.recv().await.unwrap() {
            GangEvent::GroupCreated { group, quorum, .. } => {
                assert_eq!(group.as_str(), "default/g1");
                assert_eq!(quorum.get(), 2);
            }
            other => panic!("Wrong event type received: {:?}", other),
        }
        assert!(matches!(receiver.try_recv(), Err(EventBusError::Empty)));
    }

    #[tokio::test]
    async fn test_group_event_filtering() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe_group("default/mine".into());

        event_bus.publish(created("default/other"));
        event_bus.publish(created("default/mine"));

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.group().as_str(), "default/mine");
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let event_bus = EventBus::new(10);
        let mut receiver1 = event_bus.subscribe();
        let mut receiver2 = event_bus.subscribe();

        assert_eq!(event_bus.subscriber_count(), 2);

        event_bus.publish(created("default/g1"));

        let _ = receiver1.recv().await.unwrap();
        let _ = receiver2.recv().await.unwrap();
    }

    #[test]
    fn test_publish_without_subscribers() {
        let event_bus = EventBus::default();
        event_bus.publish(created("default/g1"));
        assert_eq!(event_bus.subscriber_count(), 0);
    }
}
