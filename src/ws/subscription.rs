//! Per-connection subscription manager.
//!
//! Tracks which wallets a WebSocket client follows and filters
//! notifications server-side.

use std::collections::HashSet;

use crate::domain::{Notification, WalletAddress};

/// Manages the wallet subscriptions of a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed wallets. Ignored while `subscribe_all` is set.
    wallets: HashSet<WalletAddress>,
    /// Whether the client follows every wallet (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds wallets to the subscription set.
    pub fn subscribe(&mut self, wallets: &[WalletAddress], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.wallets.extend(wallets.iter().cloned());
    }

    /// Removes wallets from the subscription set.
    pub fn unsubscribe(&mut self, wallets: &[WalletAddress]) {
        for wallet in wallets {
            self.wallets.remove(wallet);
        }
    }

    /// Whether the notification should be delivered. Notifications
    /// without a wallet go to everyone.
    #[must_use]
    pub fn matches(&self, notification: &Notification) -> bool {
        match &notification.wallet {
            None => true,
            Some(wallet) => self.subscribe_all || self.wallets.contains(wallet),
        }
    }

    /// Number of explicitly subscribed wallets.
    #[must_use]
    pub fn count(&self) -> usize {
        self.wallets.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn wallet(last: char) -> WalletAddress {
        let Ok(w) = WalletAddress::parse(&format!("0x{}{last}", "0".repeat(39))) else {
            panic!("valid address");
        };
        w
    }

    fn for_wallet(last: char) -> Notification {
        Notification::info("stats").for_wallet(&wallet(last))
    }

    #[test]
    fn global_notifications_always_match() {
        let mgr = SubscriptionManager::new();
        assert!(mgr.matches(&Notification::info("contract stats")));
        assert!(!mgr.matches(&for_wallet('1')));
    }

    #[test]
    fn subscribe_specific_wallet() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[wallet('1')], false);
        assert!(mgr.matches(&for_wallet('1')));
        assert!(!mgr.matches(&for_wallet('2')));
    }

    #[test]
    fn wildcard_matches_everything() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[], true);
        assert!(mgr.matches(&for_wallet('1')));
        assert!(mgr.matches(&for_wallet('2')));
    }

    #[test]
    fn unsubscribe_removes_wallet() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[wallet('1'), wallet('2')], false);
        assert_eq!(mgr.count(), 2);
        mgr.unsubscribe(&[wallet('1')]);
        assert!(!mgr.matches(&for_wallet('1')));
        assert_eq!(mgr.count(), 1);
    }
}
