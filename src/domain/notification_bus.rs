//! Broadcast channel for freshly stored notifications.
//!
//! [`NotificationBus`] wraps a [`tokio::sync::broadcast`] channel. Every
//! notification written by a tick is published here after it is stored,
//! and each WebSocket connection subscribes to receive the ones addressed
//! to the users it follows.

use tokio::sync::broadcast;

use super::Notification;

/// Broadcast bus for [`Notification`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity
/// (default 10 000). When the ring buffer is full, the oldest entries are
/// dropped for lagging receivers.
#[derive(Debug, Clone)]
pub struct NotificationBus {
    sender: broadcast::Sender<Notification>,
}

impl NotificationBus {
    /// Creates a new `NotificationBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a notification to all subscribers.
    ///
    /// Returns the number of receivers that got it. Without receivers the
    /// notification is silently dropped; it is already in the store.
    pub fn publish(&self, notification: Notification) -> usize {
        self.sender.send(notification).unwrap_or(0)
    }

    /// Creates a receiver for all future notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::notification::round_end;
    use crate::domain::{EventId, UserId};
    use chrono::Utc;

    fn make_notification(user: u64) -> Notification {
        round_end(UserId::new(user), EventId::new(1), 1, Utc::now())
    }

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = NotificationBus::new(100);
        let mut rx = bus.subscribe();

        let sent = make_notification(7);
        let count = bus.publish(sent.clone());
        assert_eq!(count, 1);

        let received = rx.recv().await;
        let Ok(received) = received else {
            panic!("expected to receive notification");
        };
        assert_eq!(received, sent);
    }

    #[tokio::test]
    async fn publish_without_receivers_returns_zero() {
        let bus = NotificationBus::new(100);
        assert_eq!(bus.publish(make_notification(1)), 0);
    }

    #[tokio::test]
    async fn multiple_receivers() {
        let bus = NotificationBus::new(100);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);

        let count = bus.publish(make_notification(2));
        assert_eq!(count, 2);

        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn receiver_count_drops_on_release() {
        let bus = NotificationBus::new(100);
        let rx = bus.subscribe();
        assert_eq!(bus.receiver_count(), 1);
        drop(rx);
        assert_eq!(bus.receiver_count(), 0);
    }
}
