//! Notification records and the factories that compose them.
//!
//! Each notification carries a structured [`NotificationKind`] marker next
//! to its human-readable text. Deduplication compares markers, so the
//! wording can change without re-sending anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EventId, NotificationId, TableId, UserId};

/// What a notification announces, scoped to its event and round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationKind {
    /// A round started and the recipient was seated.
    TableAssignment {
        /// Event the round belongs to.
        event_id: EventId,
        /// Round that started.
        round_id: u32,
        /// Table the recipient was assigned to.
        table_id: TableId,
    },
    /// A round is about to end.
    RoundEnd {
        /// Event the round belongs to.
        event_id: EventId,
        /// Round that is ending.
        round_id: u32,
    },
    /// The last round of the event has elapsed.
    EventCompleted {
        /// Event that concluded.
        event_id: EventId,
    },
}

impl NotificationKind {
    /// Event this notification belongs to.
    #[must_use]
    pub const fn event_id(&self) -> EventId {
        match self {
            Self::TableAssignment { event_id, .. }
            | Self::RoundEnd { event_id, .. }
            | Self::EventCompleted { event_id } => *event_id,
        }
    }

    /// Returns the kind as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TableAssignment { .. } => "table_assignment",
            Self::RoundEnd { .. } => "round_end",
            Self::EventCompleted { .. } => "event_completed",
        }
    }
}

/// A message addressed to one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Opaque unique id.
    pub id: NotificationId,
    /// Recipient.
    pub user_id: UserId,
    /// Human-readable message.
    pub text: String,
    /// Structured marker used for deduplication.
    pub kind: NotificationKind,
    /// Composition time.
    pub created_at: DateTime<Utc>,
}

/// Announces a participant's table for a round that just started.
///
/// The tablemates sentence is omitted when `tablemates` is empty.
#[must_use]
pub fn table_assignment(
    user_id: UserId,
    event_id: EventId,
    round_id: u32,
    table_id: TableId,
    tablemates: &[String],
    now: DateTime<Utc>,
) -> Notification {
    let mut text = format!("Round {round_id} is starting! You are assigned to Table {table_id}.");
    if !tablemates.is_empty() {
        text.push_str(" Your tablemates: ");
        text.push_str(&tablemates.join(", "));
        text.push('.');
    }
    compose(
        user_id,
        text,
        NotificationKind::TableAssignment {
            event_id,
            round_id,
            table_id,
        },
        now,
    )
}

/// Warns a participant that the current round is ending.
#[must_use]
pub fn round_end(
    user_id: UserId,
    event_id: EventId,
    round_id: u32,
    now: DateTime<Utc>,
) -> Notification {
    compose(
        user_id,
        format!("Round {round_id} has ended. Please prepare for the next round."),
        NotificationKind::RoundEnd { event_id, round_id },
        now,
    )
}

/// Thanks a participant once the event is over.
#[must_use]
pub fn event_completion(user_id: UserId, event_id: EventId, now: DateTime<Utc>) -> Notification {
    compose(
        user_id,
        "Thank you for participating! The event has concluded. \
         We hope you made many new connections!"
            .to_string(),
        NotificationKind::EventCompleted { event_id },
        now,
    )
}

fn compose(
    user_id: UserId,
    text: String,
    kind: NotificationKind,
    now: DateTime<Utc>,
) -> Notification {
    Notification {
        id: NotificationId::new(),
        user_id,
        text,
        kind,
        created_at: now,
    }
}

/// A user's notifications, newest first.
#[must_use]
pub fn notifications_for_user(all: &[Notification], user_id: UserId) -> Vec<Notification> {
    let mut feed: Vec<Notification> = all
        .iter()
        .filter(|n| n.user_id == user_id)
        .cloned()
        .collect();
    feed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    feed
}
