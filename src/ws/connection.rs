//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching subscription commands and forwarding the notifications of
//! followed users.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType, resolve_selectors};
use super::subscription::SubscriptionManager;
use crate::api::dto::NotificationDto;
use crate::domain::Notification;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and applies them.
/// - Forwards matching notifications from the [`broadcast::Receiver`].
pub async fn run_connection(
    socket: WebSocket,
    mut notification_rx: broadcast::Receiver<Notification>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs);
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            received = notification_rx.recv() => {
                match received {
                    Ok(notification) => {
                        if !subs.matches(notification.user_id) {
                            continue;
                        }
                        let Some(json) = notification_frame(&notification) else {
                            continue;
                        };
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind notification bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Serializes a notification into an `event` envelope.
fn notification_frame(notification: &Notification) -> Option<String> {
    let payload = serde_json::to_value(NotificationDto::from(notification)).ok()?;
    let msg = WsMessage::new(
        notification.id.as_uuid().to_string(),
        WsMessageType::Event,
        payload,
    );
    serde_json::to_string(&msg).ok()
}

/// Handles a text message from the client, returning an optional JSON response.
fn handle_text_message(text: &str, subs: &mut SubscriptionManager) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error(String::new(), 400, "malformed JSON")).ok();
    };

    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return serde_json::to_string(&WsMessage::error(msg.id, 404, "unknown command")).ok();
    };

    let payload = match command {
        WsCommand::Subscribe { user_ids } => {
            let (ids, wildcard) = resolve_selectors(&user_ids);
            subs.subscribe(&ids, wildcard);
            serde_json::json!({
                "subscribed": ids,
                "count": subs.count(),
                "wildcard": subs.is_subscribed_all(),
            })
        }
        WsCommand::Unsubscribe { user_ids } => {
            let (ids, wildcard) = resolve_selectors(&user_ids);
            subs.unsubscribe(&ids, wildcard);
            serde_json::json!({
                "unsubscribed": ids,
                "remaining_count": subs.count(),
                "wildcard": subs.is_subscribed_all(),
            })
        }
    };
    serde_json::to_string(&WsMessage::new(msg.id, WsMessageType::Response, payload)).ok()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::notification::round_end;
    use crate::domain::{EventId, UserId};

    fn reply(text: &str, subs: &mut SubscriptionManager) -> WsMessage {
        let Some(json) = handle_text_message(text, subs) else {
            panic!("expected a reply");
        };
        let Ok(msg) = serde_json::from_str(&json) else {
            panic!("reply is an envelope");
        };
        msg
    }

    fn command(payload: serde_json::Value) -> String {
        serde_json::json!({
            "id": "req-1",
            "type": "command",
            "timestamp": Utc::now(),
            "payload": payload,
        })
        .to_string()
    }

    #[test]
    fn subscribe_then_unsubscribe() {
        let mut subs = SubscriptionManager::new();
        let msg = reply(
            &command(serde_json::json!({ "command": "subscribe", "user_ids": [1, 2] })),
            &mut subs,
        );
        assert_eq!(msg.msg_type, WsMessageType::Response);
        assert_eq!(msg.id, "req-1");
        assert_eq!(msg.payload["count"], 2);
        assert!(subs.matches(UserId::new(2)));

        let msg = reply(
            &command(serde_json::json!({ "command": "unsubscribe", "user_ids": [2] })),
            &mut subs,
        );
        assert_eq!(msg.payload["remaining_count"], 1);
        assert!(!subs.matches(UserId::new(2)));
    }

    #[test]
    fn malformed_and_unknown_are_errors() {
        let mut subs = SubscriptionManager::new();
        let msg = reply("not json", &mut subs);
        assert_eq!(msg.msg_type, WsMessageType::Error);
        assert_eq!(msg.payload["code"], 400);

        let msg = reply(&command(serde_json::json!({ "command": "dance" })), &mut subs);
        assert_eq!(msg.msg_type, WsMessageType::Error);
        assert_eq!(msg.payload["code"], 404);
    }

    #[test]
    fn frames_carry_the_notification() {
        let n = round_end(UserId::new(9), EventId::new(2), 3, Utc::now());
        let Some(json) = notification_frame(&n) else {
            panic!("frame");
        };
        let Ok(msg) = serde_json::from_str::<WsMessage>(&json) else {
            panic!("envelope");
        };
        assert_eq!(msg.msg_type, WsMessageType::Event);
        assert_eq!(msg.payload["user_id"], 9);
        assert_eq!(msg.payload["kind"], "round_end");
        assert_eq!(msg.payload["round_id"], 3);
    }
}
