//! Event bus for broadcasting shell events to subscribers.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{trace, warn};

use crate::event::ShellEvent;

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Event bus for broadcasting events to all subscribers.
///
/// Clones share the same underlying channel. Publishing never blocks and
/// never fails; with no subscribers the event is simply discarded.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<ShellEvent>>,
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Publish an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    pub fn publish(&self, event: ShellEvent) -> usize {
        let event_type = event.event_type();
        if let Ok(count) = self.sender.send(Arc::new(event)) {
            trace!(event_type, receiver_count = count, "Event published");
            count
        } else {
            trace!(event_type, "No receivers for event");
            0
        }
    }

    /// Subscribe to every event.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), None)
    }

    /// Subscribe to events whose type matches `topic_pattern`.
    ///
    /// The pattern is either an exact event type (`window.closed`) or a
    /// prefix ending in `*` (`window.*`).
    #[must_use]
    pub fn subscribe_topic(&self, topic_pattern: impl Into<String>) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), Some(topic_pattern.into()))
    }

    /// Number of live receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver for events from the event bus.
pub struct EventReceiver {
    receiver: broadcast::Receiver<Arc<ShellEvent>>,
    topic_pattern: Option<String>,
}

impl EventReceiver {
    fn new(receiver: broadcast::Receiver<Arc<ShellEvent>>, topic_pattern: Option<String>) -> Self {
        Self {
            receiver,
            topic_pattern,
        }
    }

    fn matches(&self, event: &ShellEvent) -> bool {
        let Some(pattern) = &self.topic_pattern else {
            return true;
        };
        if let Some(prefix) = pattern.strip_suffix('*') {
            event.event_type().starts_with(prefix)
        } else {
            event.event_type() == pattern
        }
    }

    /// Receive the next matching event.
    ///
    /// Returns `None` once every sender is gone. A lagging receiver skips
    /// the events it missed and keeps going.
    pub async fn recv(&mut self) -> Option<Arc<ShellEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                },
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive the next matching event without blocking.
    pub fn try_recv(&mut self) -> Option<Arc<ShellEvent>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                },
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }

    /// Drain every matching event currently buffered.
    pub fn drain(&mut self) -> Vec<Arc<ShellEvent>> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl std::fmt::Debug for EventReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventReceiver")
            .field("topic_pattern", &self.topic_pattern)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use webdesk_core::{AppId, WindowId};

    use super::*;

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        assert_eq!(bus.publish(ShellEvent::RegistryChanged), 1);

        let event = receiver.recv().await.unwrap();
        assert_eq!(*event, ShellEvent::RegistryChanged);
    }

    #[tokio::test]
    async fn test_no_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(ShellEvent::SessionEnded), 0);
    }

    #[tokio::test]
    async fn test_cloned_bus_shares_channel() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        bus.clone().publish(ShellEvent::SessionEnded);
        assert!(receiver.try_recv().is_some());
    }

    #[tokio::test]
    async fn test_topic_filter() {
        let bus = EventBus::new();
        let mut windows = bus.subscribe_topic("window.*");
        let mut closed = bus.subscribe_topic("window.closed");

        let window_id = WindowId::new();
        bus.publish(ShellEvent::RegistryChanged);
        bus.publish(ShellEvent::WindowFocused { window_id });
        bus.publish(ShellEvent::WindowClosed {
            window_id,
            app_id: AppId::from("clock"),
        });

        let got: Vec<_> = windows.drain().iter().map(|e| e.event_type()).collect();
        assert_eq!(got, vec!["window.focused", "window.closed"]);
        assert_eq!(closed.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        assert!(receiver.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_receiver_recovers() {
        let bus = EventBus::with_capacity(2);
        let mut receiver = bus.subscribe();
        for _ in 0..5 {
            bus.publish(ShellEvent::RegistryChanged);
        }
        bus.publish(ShellEvent::SessionEnded);
        let events = receiver.drain();
        assert_eq!(events.last().map(|e| e.event_type()), Some("session.ended"));
    }
}
