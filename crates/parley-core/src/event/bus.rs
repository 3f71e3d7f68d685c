//! Broadcast event bus for distributing `ConversationEvent` to subscribers.
//!
//! Built on `tokio::sync::broadcast`. Events are published only after the
//! corresponding write committed; a publish nobody receives is logged and
//! otherwise ignored.

use parley_types::event::ConversationEvent;
use tokio::sync::broadcast;

/// Multi-consumer event bus for conversation changes.
///
/// Cloning the bus clones the sender, allowing multiple producers and
/// consumers.
pub struct EventBus {
    sender: broadcast::Sender<ConversationEvent>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new subscriber that will receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers.
    ///
    /// Non-fatal: the state change behind the event is already committed.
    pub fn publish(&self, event: ConversationEvent) {
        if let Err(err) = self.sender.send(event) {
            tracing::trace!(
                conversation_id = %err.0.conversation_id(),
                "No event subscribers, event dropped"
            );
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parley_types::chat::Conversation;
    use uuid::Uuid;

    fn sample_event() -> ConversationEvent {
        ConversationEvent::ConversationCreated {
            conversation: Conversation::new(Uuid::now_v7(), "Hello", Utc::now()),
        }
    }

    #[tokio::test]
    async fn publish_and_subscribe_delivers_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(sample_event());

        let received = rx.recv().await.unwrap();
        assert!(matches!(received, ConversationEvent::ConversationCreated { .. }));
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new(16);
        bus.publish(sample_event());
        bus.publish(sample_event());
    }

    #[test]
    fn clone_shares_channel() {
        let bus = EventBus::new(16);
        let bus2 = bus.clone();
        let mut rx = bus.subscribe();

        bus2.publish(sample_event());

        assert!(rx.try_recv().is_ok());
    }
}
