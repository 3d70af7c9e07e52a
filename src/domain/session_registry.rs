//! Concurrent chat session storage with per-session locking.
//!
//! [`SessionRegistry`] stores all open chat sessions in a `HashMap` where
//! each entry is individually protected by a [`tokio::sync::RwLock`].
//! Turns in different sessions proceed concurrently; turns in the same
//! session are serialized.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{ChatSession, WalletAddress};
use crate::error::GatewayError;

/// Central store for open chat sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<uuid::Uuid, Arc<RwLock<ChatSession>>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a session, returning its id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Conflict`] if a session with the same id
    /// already exists (should never happen with UUID v4).
    pub async fn insert(&self, session: ChatSession) -> Result<uuid::Uuid, GatewayError> {
        let id = session.id;
        let mut map = self.sessions.write().await;
        if map.contains_key(&id) {
            return Err(GatewayError::Conflict(format!("session {id} already exists")));
        }
        map.insert(id, Arc::new(RwLock::new(session)));
        Ok(id)
    }

    /// Returns the session behind its per-session lock.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] if no such session exists.
    pub async fn get(&self, id: uuid::Uuid) -> Result<Arc<RwLock<ChatSession>>, GatewayError> {
        let map = self.sessions.read().await;
        map.get(&id)
            .cloned()
            .ok_or(GatewayError::SessionNotFound(id))
    }

    /// Removes a session, returning a snapshot of its final state.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] if no such session exists.
    pub async fn remove(&self, id: uuid::Uuid) -> Result<ChatSession, GatewayError> {
        let lock = {
            let mut map = self.sessions.write().await;
            map.remove(&id).ok_or(GatewayError::SessionNotFound(id))?
        };
        let session = lock.read().await.clone();
        Ok(session)
    }

    /// Removes every session owned by `wallet`, returning how many were
    /// dropped.
    pub async fn remove_for_wallet(&self, wallet: &WalletAddress) -> usize {
        let mut map = self.sessions.write().await;
        let mut doomed = Vec::new();
        for (id, lock) in map.iter() {
            if lock.read().await.wallet == *wallet {
                doomed.push(*id);
            }
        }
        for id in &doomed {
            map.remove(id);
        }
        doomed.len()
    }

    /// Returns the number of open sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no sessions are open.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn wallet(last: char) -> WalletAddress {
        let raw = format!("0x{}{last}", "a".repeat(39));
        let Ok(w) = WalletAddress::parse(&raw) else {
            panic!("valid address");
        };
        w
    }

    #[tokio::test]
    async fn insert_and_get() {
        let registry = SessionRegistry::new();
        let session = ChatSession::new(wallet('1'));
        let id = session.id;

        let result = registry.insert(session).await;
        assert!(result.is_ok_and(|got| got == id));
        assert!(registry.get(id).await.is_ok());
    }

    #[tokio::test]
    async fn get_nonexistent_returns_error() {
        let registry = SessionRegistry::new();
        let result = registry.get(uuid::Uuid::new_v4()).await;
        assert!(matches!(result, Err(GatewayError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn remove_returns_snapshot() {
        let registry = SessionRegistry::new();
        let session = ChatSession::new(wallet('1'));
        let id = session.id;
        let _ = registry.insert(session).await;

        let removed = registry.remove(id).await;
        assert!(removed.is_ok_and(|s| s.id == id));
        assert!(registry.get(id).await.is_err());
        assert!(registry.remove(id).await.is_err());
    }

    #[tokio::test]
    async fn remove_for_wallet_only_drops_that_wallet() {
        let registry = SessionRegistry::new();
        let _ = registry.insert(ChatSession::new(wallet('1'))).await;
        let _ = registry.insert(ChatSession::new(wallet('1'))).await;
        let _ = registry.insert(ChatSession::new(wallet('2'))).await;

        assert_eq!(registry.remove_for_wallet(&wallet('1')).await, 2);
        assert_eq!(registry.len().await, 1);
        assert!(!registry.is_empty().await);
    }
}
