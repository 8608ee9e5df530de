//! Notification feed and scheduler control DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Notification, NotificationKind};
use crate::service::TickReport;

/// A notification as delivered over REST and WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NotificationDto {
    /// Notification id.
    pub id: uuid::Uuid,
    /// Recipient.
    pub user_id: u64,
    /// Event the notification belongs to.
    pub event_id: u64,
    /// `table_assignment`, `round_end`, or `event_completed`.
    pub kind: String,
    /// Round concerned, if any.
    pub round_id: Option<u32>,
    /// Table assigned, for table announcements.
    pub table_id: Option<u64>,
    /// Human-readable message.
    pub text: String,
    /// Composition time.
    pub created_at: DateTime<Utc>,
}

impl From<&Notification> for NotificationDto {
    fn from(n: &Notification) -> Self {
        let (round_id, table_id) = match n.kind {
            NotificationKind::TableAssignment {
                round_id, table_id, ..
            } => (Some(round_id), Some(table_id.get())),
            NotificationKind::RoundEnd { round_id, .. } => (Some(round_id), None),
            NotificationKind::EventCompleted { .. } => (None, None),
        };
        Self {
            id: *n.id.as_uuid(),
            user_id: n.user_id.get(),
            event_id: n.kind.event_id().get(),
            kind: n.kind.as_str().to_string(),
            round_id,
            table_id,
            text: n.text.clone(),
            created_at: n.created_at,
        }
    }
}

/// Response body for `GET /users/{id}/notifications`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationListResponse {
    /// Notifications, newest first.
    pub data: Vec<NotificationDto>,
}

/// Response body for `POST /scheduler/tick`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TickResponse {
    /// Instant the tick observed.
    pub ticked_at: DateTime<Utc>,
    /// Assignments newly written.
    pub assignments_written: usize,
    /// Notifications newly written.
    pub notifications_written: usize,
    /// Events skipped because their layout could not be seated.
    pub rejected_events: Vec<u64>,
}

impl From<TickReport> for TickResponse {
    fn from(report: TickReport) -> Self {
        Self {
            ticked_at: report.ticked_at,
            assignments_written: report.assignments_written,
            notifications_written: report.notifications_written,
            rejected_events: report.rejected_events.iter().map(|id| id.get()).collect(),
        }
    }
}

/// Response body for the driver status and control endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DriverStatusResponse {
    /// Whether the periodic driver is running.
    pub running: bool,
    /// Seconds between scheduled ticks.
    pub tick_interval_secs: u64,
}
