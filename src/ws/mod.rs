//! WebSocket layer: notification delivery.
//!
//! The WebSocket endpoint at `/ws` streams [`crate::domain::Notification`]s
//! to clients. Clients subscribe to wallet addresses (or `"*"`);
//! notifications without a wallet reach every client.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
