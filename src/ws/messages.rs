//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::UserId;

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server message stamped with the current time.
    #[must_use]
    pub fn new(id: String, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error message with a numeric code.
    #[must_use]
    pub fn error(id: String, code: u16, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client notification push.
    Event,
    /// Server → Client error.
    Error,
}

/// One entry of a `user_ids` list: a numeric id or the `"*"` wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UserSelector {
    /// A user id.
    Id(u64),
    /// `"*"`, or a user id written as a string.
    Text(String),
}

/// Commands that a client can send over WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Receive notifications addressed to these users.
    Subscribe {
        /// User ids to follow. `"*"` follows everyone.
        user_ids: Vec<UserSelector>,
    },
    /// Stop receiving notifications for these users.
    Unsubscribe {
        /// User ids to drop. `"*"` clears the wildcard.
        user_ids: Vec<UserSelector>,
    },
}

/// Splits selectors into concrete ids and a wildcard flag. Unparsable
/// strings are ignored.
#[must_use]
pub fn resolve_selectors(selectors: &[UserSelector]) -> (Vec<UserId>, bool) {
    let mut ids = Vec::with_capacity(selectors.len());
    let mut wildcard = false;
    for selector in selectors {
        match selector {
            UserSelector::Id(raw) => ids.push(UserId::new(*raw)),
            UserSelector::Text(text) if text.trim() == "*" => wildcard = true,
            UserSelector::Text(text) => {
                if let Ok(raw) = text.trim().parse::<u64>() {
                    ids.push(UserId::new(raw));
                }
            }
        }
    }
    (ids, wildcard)
}
