//! Persistence layer: the store seam between the scheduler and its records.
//!
//! [`SchedulerStore`] is the contract the service layer depends on. It owns
//! id generation for users and events and records each tick's assignments
//! and notifications together, "if absent" by id, which is what makes a
//! duplicated or retried tick harmless. Two implementations are provided:
//! [`InMemoryStore`] for tests and single-process deployments, and
//! [`PostgresStore`] backed by `sqlx::PgPool`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Event, EventDraft, EventId, Notification, RoundAssignment, User, UserId};
use crate::error::SchedulerError;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Durable home of users, events, round assignments and notifications.
#[async_trait]
pub trait SchedulerStore: Send + Sync + std::fmt::Debug {
    /// Registers a user under the next free id.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PersistenceError`] on storage failure.
    async fn create_user(&self, name: &str) -> Result<User, SchedulerError>;

    /// Looks up a single user.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::UserNotFound`] if the id is unknown.
    async fn get_user(&self, id: UserId) -> Result<User, SchedulerError>;

    /// Returns all users ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PersistenceError`] on storage failure.
    async fn list_users(&self) -> Result<Vec<User>, SchedulerError>;

    /// Stores a validated event under the next free id.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PersistenceError`] on storage failure.
    async fn create_event(&self, draft: EventDraft) -> Result<Event, SchedulerError>;

    /// Looks up a single event.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::EventNotFound`] if the id is unknown.
    async fn get_event(&self, id: EventId) -> Result<Event, SchedulerError>;

    /// Returns all events ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PersistenceError`] on storage failure.
    async fn list_events(&self) -> Result<Vec<Event>, SchedulerError>;

    /// Sets the start instant of an event that has not started yet.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::EventNotFound`] if the id is unknown and
    /// [`SchedulerError::EventAlreadyStarted`] if it already has a start.
    async fn mark_started(&self, id: EventId, at: DateTime<Utc>) -> Result<Event, SchedulerError>;

    /// Returns recorded assignments, optionally for one event only.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PersistenceError`] on storage failure.
    async fn list_assignments(
        &self,
        event_id: Option<EventId>,
    ) -> Result<Vec<RoundAssignment>, SchedulerError>;

    /// Returns recorded notifications, optionally for one recipient only.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PersistenceError`] on storage failure.
    async fn list_notifications(
        &self,
        user_id: Option<UserId>,
    ) -> Result<Vec<Notification>, SchedulerError>;

    /// Records one tick's output as a single unit.
    ///
    /// Assignments whose id is already stored are dropped. Table
    /// announcements are kept only for the seatings written here (see
    /// [`crate::domain::retain_recorded_tables`]); the survivors are then
    /// inserted if absent by id. Either everything is written or nothing is.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PersistenceError`] on storage failure, in
    /// which case no record of the tick is kept.
    async fn record_tick(
        &self,
        assignments: &[RoundAssignment],
        notifications: &[Notification],
    ) -> Result<TickWrite, SchedulerError>;
}

/// Records actually written by [`SchedulerStore::record_tick`].
#[derive(Debug, Clone, Default)]
pub struct TickWrite {
    /// Assignments that were not stored before.
    pub assignments: Vec<RoundAssignment>,
    /// Notifications that were not stored before.
    pub notifications: Vec<Notification>,
}
