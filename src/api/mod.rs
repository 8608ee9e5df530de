//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` and
//! `/config/schedule` sit at the root. With the `swagger-ui` feature the
//! generated document is served at `/api-docs/openapi.json` and browsable
//! at `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the scheduler REST API.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "roundtable",
        version = env!("CARGO_PKG_VERSION"),
        description = "Round-based table seating and notification scheduler"
    ),
    paths(
        handlers::system::health_handler,
        handlers::system::schedule_handler,
        handlers::user::create_user,
        handlers::user::list_users,
        handlers::user::list_notifications,
        handlers::event::create_event,
        handlers::event::list_events,
        handlers::event::get_event,
        handlers::event::start_event,
        handlers::round::list_rounds,
        handlers::round::get_user_table,
        handlers::round::get_pairings,
        handlers::scheduler::run_tick,
        handlers::scheduler::get_driver,
        handlers::scheduler::start_driver,
        handlers::scheduler::stop_driver,
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::error::ErrorBody,
            dto::PaginationMeta,
            dto::CreateUserRequest,
            dto::UserDto,
            dto::UserListResponse,
            dto::CreateEventRequest,
            dto::StartEventRequest,
            dto::EventDto,
            dto::EventListResponse,
            dto::AssignmentDto,
            dto::AssignmentListResponse,
            dto::UserTableResponse,
            dto::PairingStatsDto,
            dto::NotificationDto,
            dto::NotificationListResponse,
            dto::TickResponse,
            dto::DriverStatusResponse,
        )
    ),
    tags(
        (name = "System", description = "Health and schedule constants"),
        (name = "Users", description = "Participants and their notification feeds"),
        (name = "Events", description = "Event lifecycle"),
        (name = "Rounds", description = "Seatings and pairing statistics"),
        (name = "Scheduler", description = "Tick control"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
