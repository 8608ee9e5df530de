//! Round seating and pairing-statistics DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::user_dto::UserDto;
use crate::domain::RoundAssignment;
use crate::service::PairingStats;

/// Query parameters for `GET /events/{id}/rounds`.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoundQuery {
    /// Restrict to one round (1-based).
    #[serde(default)]
    pub round: Option<u32>,
}

/// One table's seating in one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AssignmentDto {
    /// Deterministic assignment id.
    pub id: uuid::Uuid,
    /// Owning event.
    pub event_id: u64,
    /// Round number, starting at 1.
    pub round_id: u32,
    /// Table id.
    pub table_id: u64,
    /// Seated user ids.
    pub user_ids: Vec<u64>,
}

impl From<&RoundAssignment> for AssignmentDto {
    fn from(a: &RoundAssignment) -> Self {
        Self {
            id: *a.id.as_uuid(),
            event_id: a.event_id.get(),
            round_id: a.round_id,
            table_id: a.table_id.get(),
            user_ids: a.user_ids.iter().map(|id| id.get()).collect(),
        }
    }
}

/// Response body for `GET /events/{id}/rounds`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignmentListResponse {
    /// Seatings ordered by round then table.
    pub data: Vec<AssignmentDto>,
}

/// Response body for `GET /events/{id}/rounds/{round}/users/{user}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserTableResponse {
    /// The table the user sits at.
    pub assignment: AssignmentDto,
    /// Everyone else at the table, with display names.
    pub tablemates: Vec<UserDto>,
}

/// Response body for `GET /events/{id}/pairings`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PairingStatsDto {
    /// Event the figures describe.
    pub event_id: u64,
    /// Distinct rounds with a recorded seating.
    pub rounds_seated: usize,
    /// Pairs that shared a table at least once.
    pub distinct_pairs: usize,
    /// Pairs that shared a table more than once.
    pub repeated_pairs: usize,
    /// Most rounds any single pair shared.
    pub max_pair_count: u32,
}

impl From<PairingStats> for PairingStatsDto {
    fn from(stats: PairingStats) -> Self {
        Self {
            event_id: stats.event_id.get(),
            rounds_seated: stats.rounds_seated,
            distinct_pairs: stats.distinct_pairs,
            repeated_pairs: stats.repeated_pairs,
            max_pair_count: stats.max_pair_count,
        }
    }
}
