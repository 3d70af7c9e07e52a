//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered notifications.

use axum::extract::ws::{Message, WebSocket};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::{Notification, WalletAddress};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching notifications from the [`broadcast::Receiver`].
pub async fn run_connection(socket: WebSocket, mut event_rx: broadcast::Receiver<Notification>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs);
                        let json = serde_json::to_string(&reply).unwrap_or_default();
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(notification) => {
                        if !should_forward(&subs, &notification, Utc::now()) {
                            continue;
                        }
                        let msg = WsMessage::new(
                            notification.id.to_string(),
                            WsMessageType::Notification,
                            serde_json::to_value(&notification).unwrap_or_default(),
                        );
                        let json = serde_json::to_string(&msg).unwrap_or_default();
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// A notification is forwarded when the client subscribed to it and it
/// has not expired while the receiver lagged.
fn should_forward(subs: &SubscriptionManager, notification: &Notification, now: DateTime<Utc>) -> bool {
    subs.matches(notification) && !notification.is_expired(now)
}

/// Handles a text message from the client and builds the reply.
fn handle_text_message(text: &str, subs: &mut SubscriptionManager) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error("", 400, "malformed JSON");
    };
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return WsMessage::error(msg.id, 404, "unknown command");
    };

    match command {
        WsCommand::Subscribe { wallets } => {
            let (parsed, wildcard) = parse_wallets(&wallets);
            subs.subscribe(&parsed, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": parsed.iter().map(WalletAddress::as_str).collect::<Vec<_>>(),
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Unsubscribe { wallets } => {
            let (parsed, _) = parse_wallets(&wallets);
            subs.unsubscribe(&parsed);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": parsed.iter().map(WalletAddress::as_str).collect::<Vec<_>>(),
                    "remaining_count": subs.count(),
                }),
            )
        }
        WsCommand::Ping => WsMessage::new(
            msg.id,
            WsMessageType::Response,
            serde_json::json!({ "pong": true }),
        ),
    }
}

/// Splits raw wallet strings into valid addresses and the wildcard flag.
/// Invalid addresses are skipped.
fn parse_wallets(raw: &[String]) -> (Vec<WalletAddress>, bool) {
    let mut wildcard = false;
    let mut wallets = Vec::new();
    for s in raw {
        if s == "*" {
            wildcard = true;
        } else if let Ok(w) = WalletAddress::parse(s) {
            wallets.push(w);
        }
    }
    (wallets, wildcard)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "0x2d6048916fd4017d9348563d442a3476a710d335";

    fn command(payload: serde_json::Value) -> String {
        serde_json::json!({
            "id": "req-1",
            "type": "command",
            "timestamp": chrono::Utc::now(),
            "payload": payload,
        })
        .to_string()
    }

    #[test]
    fn malformed_json_is_rejected() {
        let mut subs = SubscriptionManager::new();
        let reply = handle_text_message("{not json", &mut subs);
        assert_eq!(reply.msg_type, WsMessageType::Error);
        assert_eq!(reply.payload["code"], 400);
    }

    #[test]
    fn subscribe_skips_invalid_addresses() {
        let mut subs = SubscriptionManager::new();
        let text = command(serde_json::json!({
            "command": "subscribe",
            "wallets": [ALICE, "0xnope"],
        }));
        let reply = handle_text_message(&text, &mut subs);
        assert_eq!(reply.msg_type, WsMessageType::Response);
        assert_eq!(reply.id, "req-1");
        assert_eq!(reply.payload["count"], 1);
        assert_eq!(reply.payload["wildcard"], false);
    }

    #[test]
    fn wildcard_then_unsubscribe() {
        let mut subs = SubscriptionManager::new();
        let _ = handle_text_message(
            &command(serde_json::json!({ "command": "subscribe", "wallets": ["*", ALICE] })),
            &mut subs,
        );
        assert!(subs.is_subscribed_all());
        let reply = handle_text_message(
            &command(serde_json::json!({ "command": "unsubscribe", "wallets": [ALICE] })),
            &mut subs,
        );
        assert_eq!(reply.payload["remaining_count"], 0);
    }

    #[test]
    fn unknown_command_is_an_error() {
        let mut subs = SubscriptionManager::new();
        let reply = handle_text_message(
            &command(serde_json::json!({ "command": "swap" })),
            &mut subs,
        );
        assert_eq!(reply.msg_type, WsMessageType::Error);
        assert_eq!(reply.payload["code"], 404);
    }

    #[test]
    fn stale_notifications_are_dropped() {
        let subs = SubscriptionManager::new();
        let toast = Notification::info("New prompts on PromptPool");
        assert!(should_forward(&subs, &toast, toast.created_at));
        let later = toast.created_at + chrono::Duration::seconds(6);
        assert!(!should_forward(&subs, &toast, later));

        let spinner = Notification::loading("Confirming transaction");
        assert!(should_forward(&subs, &spinner, later + chrono::Duration::hours(1)));
    }

    #[test]
    fn ping_answers_pong() {
        let mut subs = SubscriptionManager::new();
        let reply = handle_text_message(&command(serde_json::json!({ "command": "ping" })), &mut subs);
        assert_eq!(reply.payload["pong"], true);
    }
}
