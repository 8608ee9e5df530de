//! # roundtable
//!
//! Round-based table seating for social mixers.
//!
//! An event runs five consecutive ten-minute rounds. At the start of each
//! round every participant is seated at a table of four, chosen to keep
//! repeat encounters low; participants are told where to sit and who their
//! tablemates are, warned a minute before the round ends, and thanked once
//! the event is over. A periodic tick drives all of it and is safe to
//! repeat at the same instant.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── SchedulerService + TickDriver (service/)
//!     ├── NotificationBus (domain/)
//!     │
//!     ├── Round clock, seating, notifications, tick (domain/)
//!     │
//!     └── SchedulerStore: in-memory or PostgreSQL (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the full HTTP application: REST routes, `/ws`, and middleware.
pub fn build_app(state: app_state::AppState) -> Router {
    Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws::handler::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
