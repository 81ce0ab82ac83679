//! In-process publication of share events.

use tokio::sync::broadcast;
use tracing::trace;

use sealshare_core::events::{DomainEvent, ShareEvent};
use sealshare_core::types::UserId;

/// Default number of events buffered per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Fan-out of [`DomainEvent`]s to any number of subscribers.
///
/// Publishing never blocks and never fails: with no subscribers the event
/// is dropped, and slow subscribers observe a lag instead of stalling
/// publishers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Publish `payload` on behalf of `actor_id`.
    pub fn publish(&self, actor_id: Option<UserId>, payload: ShareEvent) {
        let event = DomainEvent::new(actor_id, payload);
        if self.sender.send(event).is_err() {
            trace!("Share event dropped, no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealshare_core::types::ShareId;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let share_id = ShareId::new();

        bus.publish(
            None,
            ShareEvent::Revoked {
                share_id,
                automatic: true,
            },
        );

        let event = rx.recv().await.unwrap();
        assert_eq!(event.payload.share_id(), share_id);
        assert!(event.actor_id.is_none());
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::default();
        bus.publish(
            None,
            ShareEvent::Revoked {
                share_id: ShareId::new(),
                automatic: false,
            },
        );
    }
}
