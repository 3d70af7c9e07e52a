//! Broadcast channel for notifications.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Services
//! publish a [`Notification`] after every user-visible outcome, and all
//! WebSocket connections subscribe to receive the ones addressed to them.

use tokio::sync::broadcast;

use super::Notification;

/// Broadcast bus for [`Notification`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity
/// (default 10 000). When the ring buffer is full, the oldest
/// notifications are dropped for lagging receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Notification>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a notification to all subscribers.
    ///
    /// Returns the number of receivers that received it. If there are no
    /// active receivers, the notification is silently dropped.
    pub fn publish(&self, notification: Notification) -> usize {
        self.sender.send(notification).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future notifications.
    ///
    /// Each WebSocket connection should call this once on connect.
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
    use crate::domain::WalletAddress;

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(100);
        let count = bus.publish(Notification::info("New prompts on PromptPool"));
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn subscriber_receives_notification() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();

        let sent = Notification::success("Prompt pinned");
        let id = sent.id;
        bus.publish(sent);

        let Ok(received) = rx.recv().await else {
            panic!("expected to receive notification");
        };
        assert_eq!(received.id, id);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_notification() {
        let bus = EventBus::new(100);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let count = bus.publish(Notification::info("stats updated"));
        assert_eq!(count, 2);

        let Ok(n1) = rx1.recv().await else {
            panic!("rx1 failed");
        };
        let Ok(n2) = rx2.recv().await else {
            panic!("rx2 failed");
        };
        assert_eq!(n1.id, n2.id);
    }

    #[tokio::test]
    async fn lagging_receiver_loses_oldest_toasts() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for title in ["Wallet connected", "Prompt pinned", "Prompt submission confirmed"] {
            bus.publish(Notification::success(title));
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        let Ok(next) = rx.recv().await else {
            panic!("expected the second toast");
        };
        assert_eq!(next.title, "Prompt pinned");
        let Ok(last) = rx.recv().await else {
            panic!("expected the third toast");
        };
        assert_eq!(last.title, "Prompt submission confirmed");
    }

    #[tokio::test]
    async fn targeting_survives_the_channel() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        let Ok(wallet) = WalletAddress::parse("0x2D6048916FD4017D9348563d442a3476a710D335") else {
            panic!("valid address");
        };
        bus.publish(
            Notification::loading("Confirming transaction")
                .with_tx_hash("0xabc")
                .for_wallet(&wallet),
        );

        let Ok(received) = rx.recv().await else {
            panic!("expected notification");
        };
        assert_eq!(received.wallet, Some(wallet));
        assert_eq!(received.tx_hash.as_deref(), Some("0xabc"));
        assert!(received.duration_ms.is_none());
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let bus = EventBus::new(100);
        assert_eq!(bus.receiver_count(), 0);

        let rx1 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 1);

        let _rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);

        drop(rx1);
        assert_eq!(bus.receiver_count(), 1);
    }
}
