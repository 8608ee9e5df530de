//! Event handlers: create, list, get, start.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    CreateEventRequest, EventDto, EventListResponse, PaginationParams, StartEventRequest,
};
use crate::app_state::AppState;
use crate::domain::EventId;
use crate::error::{ErrorResponse, SchedulerError};

/// `POST /events` — Create an unstarted event.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidConfiguration`] unless there are
/// exactly four unique participants per unique table.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Create an event",
    description = "Creates an event with its participants and tables. The event does not start until `POST /events/{id}/start`.",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventDto),
        (status = 400, description = "Participants cannot be seated four per table", body = ErrorResponse),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, SchedulerError> {
    let event = state
        .scheduler
        .create_event(&req.name, req.participants(), req.tables())
        .await?;
    Ok((StatusCode::CREATED, Json(EventDto::at(event, Utc::now()))))
}

/// `GET /events` — List events with pagination.
///
/// # Errors
///
/// Returns [`SchedulerError`] on store failures.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    summary = "List events",
    description = "Returns a paginated list of events ordered by id, each with its current round status.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated event list", body = EventListResponse),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, SchedulerError> {
    let now = Utc::now();
    let events = state.scheduler.list_events().await?;
    let (page, pagination) = params.paginate(events);
    Ok(Json(EventListResponse {
        data: page.into_iter().map(|e| EventDto::at(e, now)).collect(),
        pagination,
    }))
}

/// `GET /events/{id}` — Event detail with round status.
///
/// # Errors
///
/// Returns [`SchedulerError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Get event",
    description = "Returns the event together with its current round, phase, and the end of the active round.",
    params(
        ("id" = u64, Path, description = "Event id"),
    ),
    responses(
        (status = 200, description = "Event detail", body = EventDto),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, SchedulerError> {
    let (event, status, phase) = state
        .scheduler
        .event_status(EventId::new(id), Utc::now())
        .await?;
    Ok(Json(EventDto::new(event, status, phase)))
}

/// `POST /events/{id}/start` — Start an event now or at a given instant.
///
/// The body is optional; `{"started_at": "..."}` schedules round 1 for
/// that instant.
///
/// # Errors
///
/// Returns [`SchedulerError::EventAlreadyStarted`] on a second start,
/// [`SchedulerError::EventNotFound`] for an unknown id, or
/// [`SchedulerError::InvalidRequest`] for a malformed body.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/start",
    tag = "Events",
    summary = "Start an event",
    description = "Sets the event's start instant. Round 1 is seated on the next tick at or after that instant.",
    params(
        ("id" = u64, Path, description = "Event id"),
    ),
    request_body(content = StartEventRequest, description = "Optional start instant", content_type = "application/json"),
    responses(
        (status = 200, description = "Event started", body = EventDto),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Event already started", body = ErrorResponse),
    )
)]
pub async fn start_event(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Bytes,
) -> Result<impl IntoResponse, SchedulerError> {
    let req: StartEventRequest = if body.iter().all(u8::is_ascii_whitespace) {
        StartEventRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| SchedulerError::InvalidRequest(format!("invalid start body: {e}")))?
    };
    let now = Utc::now();
    let at = req.started_at.unwrap_or(now);
    let event = state.scheduler.start_event(EventId::new(id), at).await?;
    Ok(Json(EventDto::at(event, now)))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", get(get_event))
        .route("/events/{id}/start", post(start_event))
}
