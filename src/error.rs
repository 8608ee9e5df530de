//! Scheduler error types with HTTP status code mapping.
//!
//! [`SchedulerError`] is the central error type for the crate. The pure
//! domain functions return it for configuration errors; the service and
//! store layers add lookup and persistence failures. Each variant maps to a
//! specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{EventId, UserId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid configuration: 39 participants cannot be seated 4 per table at 10 tables",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category             | HTTP Status                  |
/// |-----------|----------------------|------------------------------|
/// | 1000–1999 | Validation           | 400 Bad Request              |
/// | 2000–2999 | State/Not Found      | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server               | 500 Internal Server Error    |
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The event layout cannot be seated (not four per table, duplicates).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Event with the given ID was not found.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// User with the given ID was not found.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// No seating recorded for the requested event, round and user.
    #[error("no assignment for user {user_id} in round {round_id} of event {event_id}")]
    AssignmentNotFound {
        /// Event queried.
        event_id: EventId,
        /// Round queried.
        round_id: u32,
        /// User queried.
        user_id: UserId,
    },

    /// The event already has a start instant.
    #[error("event {0} has already started")]
    EventAlreadyStarted(EventId),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SchedulerError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidConfiguration(_) => 1001,
            Self::InvalidRequest(_) => 1002,
            Self::EventNotFound(_) => 2001,
            Self::UserNotFound(_) => 2002,
            Self::AssignmentNotFound { .. } => 2003,
            Self::EventAlreadyStarted(_) => 2004,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidConfiguration(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::EventNotFound(_) | Self::UserNotFound(_) | Self::AssignmentNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            Self::EventAlreadyStarted(_) => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for SchedulerError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for SchedulerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_statuses() {
        let err = SchedulerError::InvalidConfiguration("x".to_string());
        assert_eq!(err.error_code(), 1001);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = SchedulerError::EventNotFound(EventId::new(3));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "event not found: 3");

        let err = SchedulerError::EventAlreadyStarted(EventId::new(3));
        assert_eq!(err.error_code(), 2004);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err = SchedulerError::PersistenceError("down".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn response_carries_status() {
        let response = SchedulerError::UserNotFound(UserId::new(12)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
