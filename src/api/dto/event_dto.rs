//! Event DTOs for create, start, get, and list operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::round_clock::{self, EventPhase, RoundStatus};
use crate::domain::{Event, TableId, UserId};

/// Request body for `POST /events`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    /// Event name.
    pub name: String,
    /// Participant user ids, four per table.
    pub participant_ids: Vec<u64>,
    /// Table ids.
    pub table_ids: Vec<u64>,
}

impl CreateEventRequest {
    /// Participant ids as domain ids.
    #[must_use]
    pub fn participants(&self) -> Vec<UserId> {
        self.participant_ids.iter().copied().map(UserId::new).collect()
    }

    /// Table ids as domain ids.
    #[must_use]
    pub fn tables(&self) -> Vec<TableId> {
        self.table_ids.iter().copied().map(TableId::new).collect()
    }
}

/// Optional body for `POST /events/{id}/start`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StartEventRequest {
    /// Instant round 1 begins. Defaults to now.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

/// Event detail including its position in the round schedule.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventDto {
    /// Event id.
    pub id: u64,
    /// Event name.
    pub name: String,
    /// Start of round 1, absent until started.
    pub started_at: Option<DateTime<Utc>>,
    /// Participant user ids.
    pub participant_ids: Vec<u64>,
    /// Table ids.
    pub table_ids: Vec<u64>,
    /// `not_started`, `scheduled`, `active`, or `completed`.
    pub phase: String,
    /// 1-based round index at the time of the request (0 before start).
    pub current_round: i64,
    /// True while a round is in progress.
    pub is_active: bool,
    /// True once the last round has ended.
    pub is_completed: bool,
    /// End of the active round, if one is in progress.
    pub round_ends_at: Option<DateTime<Utc>>,
}

impl EventDto {
    /// Builds the DTO from an event and its status at some instant.
    #[must_use]
    pub fn new(event: Event, status: RoundStatus, phase: EventPhase) -> Self {
        let round_ends_at = status
            .active_round()
            .and_then(|round| round_clock::round_end(&event, round));
        let phase = match phase {
            EventPhase::NotStarted => "not_started",
            EventPhase::Scheduled => "scheduled",
            EventPhase::Active { .. } => "active",
            EventPhase::Completed => "completed",
        };
        Self {
            id: event.id.get(),
            name: event.name,
            started_at: event.started_at,
            participant_ids: event.participant_ids.iter().map(|id| id.get()).collect(),
            table_ids: event.table_ids.iter().map(|id| id.get()).collect(),
            phase: phase.to_string(),
            current_round: status.current_round,
            is_active: status.is_active,
            is_completed: status.is_completed,
            round_ends_at,
        }
    }

    /// Builds the DTO with status computed at `now`.
    #[must_use]
    pub fn at(event: Event, now: DateTime<Utc>) -> Self {
        let status = round_clock::status(&event, now);
        let phase = round_clock::phase(&event, now);
        Self::new(event, status, phase)
    }
}

/// Paginated list response for `GET /events`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventListResponse {
    /// Events on this page.
    pub data: Vec<EventDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
