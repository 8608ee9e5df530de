//! System endpoints: health check and schedule constants.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::round_clock::{
    ROUND_DURATION_MS, ROUND_END_WARNING_MS, SEATS_PER_TABLE, TOTAL_ROUNDS,
};

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Fixed round schedule shared by every event.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleInfo {
    round_duration_ms: i64,
    total_rounds: u32,
    seats_per_table: usize,
    round_end_warning_ms: i64,
}

/// `GET /config/schedule` — Round schedule constants.
#[utoipa::path(
    get,
    path = "/config/schedule",
    tag = "System",
    summary = "Round schedule",
    description = "Returns the round length, number of rounds, seats per table, and how long before a round ends the warning goes out.",
    responses(
        (status = 200, description = "Schedule constants", body = ScheduleInfo),
    )
)]
pub async fn schedule_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ScheduleInfo {
            round_duration_ms: ROUND_DURATION_MS,
            total_rounds: TOTAL_ROUNDS,
            seats_per_table: SEATS_PER_TABLE,
            round_end_warning_ms: ROUND_END_WARNING_MS,
        }),
    )
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/schedule", get(schedule_handler))
}
