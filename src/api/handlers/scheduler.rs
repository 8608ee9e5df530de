//! Scheduler handlers: manual tick and driver control.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{DriverStatusResponse, TickResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, SchedulerError};

/// `POST /scheduler/tick` — Run one tick now.
///
/// # Errors
///
/// Returns [`SchedulerError::PersistenceError`] if the store fails.
#[utoipa::path(
    post,
    path = "/api/v1/scheduler/tick",
    tag = "Scheduler",
    summary = "Run a tick",
    description = "Seats rounds that have started, sends round-end warnings and completion messages, and reports what was written. Safe to repeat.",
    responses(
        (status = 200, description = "Tick report", body = TickResponse),
        (status = 500, description = "Store failure", body = ErrorResponse),
    )
)]
pub async fn run_tick(State(state): State<AppState>) -> Result<impl IntoResponse, SchedulerError> {
    let report = state.scheduler.tick(Utc::now()).await?;
    Ok(Json(TickResponse::from(report)))
}

async fn driver_status(state: &AppState) -> DriverStatusResponse {
    DriverStatusResponse {
        running: state.driver.is_running().await,
        tick_interval_secs: state.driver.period().as_secs(),
    }
}

/// `GET /scheduler` — Driver status.
#[utoipa::path(
    get,
    path = "/api/v1/scheduler",
    tag = "Scheduler",
    summary = "Driver status",
    description = "Reports whether the periodic tick driver is running and its period.",
    responses(
        (status = 200, description = "Driver status", body = DriverStatusResponse),
    )
)]
pub async fn get_driver(State(state): State<AppState>) -> impl IntoResponse {
    Json(driver_status(&state).await)
}

/// `POST /scheduler/start` — Start the periodic driver.
#[utoipa::path(
    post,
    path = "/api/v1/scheduler/start",
    tag = "Scheduler",
    summary = "Start driver",
    description = "Starts periodic ticking. The first tick runs immediately. No effect if already running.",
    responses(
        (status = 200, description = "Driver status", body = DriverStatusResponse),
    )
)]
pub async fn start_driver(State(state): State<AppState>) -> impl IntoResponse {
    state.driver.start().await;
    Json(driver_status(&state).await)
}

/// `POST /scheduler/stop` — Stop the periodic driver.
#[utoipa::path(
    post,
    path = "/api/v1/scheduler/stop",
    tag = "Scheduler",
    summary = "Stop driver",
    description = "Stops periodic ticking after any in-flight tick. Manual ticks keep working.",
    responses(
        (status = 200, description = "Driver status", body = DriverStatusResponse),
    )
)]
pub async fn stop_driver(State(state): State<AppState>) -> impl IntoResponse {
    state.driver.stop().await;
    Json(driver_status(&state).await)
}

/// Scheduler routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/scheduler", get(get_driver))
        .route("/scheduler/tick", post(run_tick))
        .route("/scheduler/start", post(start_driver))
        .route("/scheduler/stop", post(stop_driver))
}
