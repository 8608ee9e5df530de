//! User handlers: register, list, notification feed.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    CreateUserRequest, NotificationDto, NotificationListResponse, PaginationParams, UserDto,
    UserListResponse,
};
use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::{ErrorResponse, SchedulerError};

/// `POST /users` — Register a participant.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidRequest`] for a blank name.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    summary = "Register a user",
    description = "Creates a participant with the next free user id.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User registered", body = UserDto),
        (status = 400, description = "Blank name", body = ErrorResponse),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, SchedulerError> {
    let user = state.scheduler.register_user(&req.name).await?;
    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

/// `GET /users` — List participants with pagination.
///
/// # Errors
///
/// Returns [`SchedulerError`] on store failures.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    summary = "List users",
    description = "Returns a paginated list of registered participants ordered by id.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated user list", body = UserListResponse),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, SchedulerError> {
    let users = state.scheduler.list_users().await?;
    let (page, pagination) = params.paginate(users);
    Ok(Json(UserListResponse {
        data: page.into_iter().map(UserDto::from).collect(),
        pagination,
    }))
}

/// `GET /users/{id}/notifications` — A user's notification feed.
///
/// # Errors
///
/// Returns [`SchedulerError::UserNotFound`] if the user is not registered.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/notifications",
    tag = "Users",
    summary = "Notification feed",
    description = "Returns every notification addressed to the user, newest first.",
    params(
        ("id" = u64, Path, description = "User id"),
    ),
    responses(
        (status = 200, description = "Notifications", body = NotificationListResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, SchedulerError> {
    let feed = state
        .scheduler
        .notifications_for_user(UserId::new(id))
        .await?;
    Ok(Json(NotificationListResponse {
        data: feed.iter().map(NotificationDto::from).collect(),
    }))
}

/// User routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}/notifications", get(list_notifications))
}
