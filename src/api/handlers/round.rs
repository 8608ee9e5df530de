//! Round handlers: seatings, a user's table, pairing statistics.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    AssignmentDto, AssignmentListResponse, PairingStatsDto, RoundQuery, UserDto,
    UserTableResponse,
};
use crate::app_state::AppState;
use crate::domain::{EventId, UserDirectory, UserId, UserIndex};
use crate::error::{ErrorResponse, SchedulerError};

/// `GET /events/{id}/rounds` — Recorded seatings.
///
/// # Errors
///
/// Returns [`SchedulerError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/rounds",
    tag = "Rounds",
    summary = "List seatings",
    description = "Returns every recorded table seating for the event, ordered by round then table. Pass `round` to restrict to one round.",
    params(
        ("id" = u64, Path, description = "Event id"),
        RoundQuery,
    ),
    responses(
        (status = 200, description = "Seatings", body = AssignmentListResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn list_rounds(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<RoundQuery>,
) -> Result<impl IntoResponse, SchedulerError> {
    let seated = state
        .scheduler
        .assignments(EventId::new(id), query.round)
        .await?;
    Ok(Json(AssignmentListResponse {
        data: seated.iter().map(AssignmentDto::from).collect(),
    }))
}

/// `GET /events/{id}/rounds/{round}/users/{user}` — One user's table.
///
/// # Errors
///
/// Returns [`SchedulerError::AssignmentNotFound`] if the round is not seated
/// or the user does not take part.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/rounds/{round}/users/{user}",
    tag = "Rounds",
    summary = "A user's table",
    description = "Returns the table a participant sits at in one round, with the names of their tablemates.",
    params(
        ("id" = u64, Path, description = "Event id"),
        ("round" = u32, Path, description = "Round number, starting at 1"),
        ("user" = u64, Path, description = "User id"),
    ),
    responses(
        (status = 200, description = "The user's table", body = UserTableResponse),
        (status = 404, description = "Event or seating not found", body = ErrorResponse),
    )
)]
pub async fn get_user_table(
    State(state): State<AppState>,
    Path((id, round, user)): Path<(u64, u32, u64)>,
) -> Result<impl IntoResponse, SchedulerError> {
    let user_id = UserId::new(user);
    let assignment = state
        .scheduler
        .user_assignment(EventId::new(id), round, user_id)
        .await?;
    let users = state.scheduler.list_users().await?;
    let directory = UserIndex::new(&users);
    let tablemates = assignment
        .tablemates_of(user_id)
        .map(|mate| UserDto {
            id: mate.get(),
            name: directory.name_or_placeholder(mate),
        })
        .collect();
    Ok(Json(UserTableResponse {
        assignment: AssignmentDto::from(&assignment),
        tablemates,
    }))
}

/// `GET /events/{id}/pairings` — Repeat-pairing statistics.
///
/// # Errors
///
/// Returns [`SchedulerError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/pairings",
    tag = "Rounds",
    summary = "Pairing statistics",
    description = "Counts how many participant pairs have shared a table, how many did so more than once, and the worst repeat.",
    params(
        ("id" = u64, Path, description = "Event id"),
    ),
    responses(
        (status = 200, description = "Pairing statistics", body = PairingStatsDto),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_pairings(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, SchedulerError> {
    let stats = state.scheduler.pairing_stats(EventId::new(id)).await?;
    Ok(Json(PairingStatsDto::from(stats)))
}

/// Round routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/{id}/rounds", get(list_rounds))
        .route("/events/{id}/rounds/{round}/users/{user}", get(get_user_table))
        .route("/events/{id}/pairings", get(get_pairings))
}
