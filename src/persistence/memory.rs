//! In-process implementation of the store.
//!
//! All records live behind a single [`tokio::sync::RwLock`]. Reads share
//! the lock; writes (id issuance, tick records, starting an event) are
//! serialized, which gives the same "insert if absent" guarantee as the
//! database unique keys. A tick is recorded under one write guard, so
//! readers never see its seatings without their announcements.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{SchedulerStore, TickWrite};
use crate::domain::{
    AssignmentId, Event, EventDraft, EventId, Notification, NotificationId, RoundAssignment, User,
    UserId, retain_recorded_tables,
};
use crate::error::SchedulerError;

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    events: BTreeMap<EventId, Event>,
    assignments: Vec<RoundAssignment>,
    assignment_ids: HashSet<AssignmentId>,
    notifications: Vec<Notification>,
    notification_ids: HashSet<NotificationId>,
    last_user_id: u64,
    last_event_id: u64,
}

/// Store keeping every record in memory. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    /// Creates an empty store. Ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchedulerStore for InMemoryStore {
    async fn create_user(&self, name: &str) -> Result<User, SchedulerError> {
        let mut tables = self.tables.write().await;
        tables.last_user_id += 1;
        let user = User {
            id: UserId::new(tables.last_user_id),
            name: name.to_string(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<User, SchedulerError> {
        self.tables
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or(SchedulerError::UserNotFound(id))
    }

    async fn list_users(&self) -> Result<Vec<User>, SchedulerError> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn create_event(&self, draft: EventDraft) -> Result<Event, SchedulerError> {
        let mut tables = self.tables.write().await;
        tables.last_event_id += 1;
        let event = Event::from_draft(EventId::new(tables.last_event_id), draft);
        tables.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn get_event(&self, id: EventId) -> Result<Event, SchedulerError> {
        self.tables
            .read()
            .await
            .events
            .get(&id)
            .cloned()
            .ok_or(SchedulerError::EventNotFound(id))
    }

    async fn list_events(&self) -> Result<Vec<Event>, SchedulerError> {
        Ok(self.tables.read().await.events.values().cloned().collect())
    }

    async fn mark_started(&self, id: EventId, at: DateTime<Utc>) -> Result<Event, SchedulerError> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .events
            .get_mut(&id)
            .ok_or(SchedulerError::EventNotFound(id))?;
        let started = slot.started(at)?;
        *slot = started.clone();
        Ok(started)
    }

    async fn list_assignments(
        &self,
        event_id: Option<EventId>,
    ) -> Result<Vec<RoundAssignment>, SchedulerError> {
        let tables = self.tables.read().await;
        Ok(tables
            .assignments
            .iter()
            .filter(|a| event_id.is_none_or(|id| a.event_id == id))
            .cloned()
            .collect())
    }

    async fn list_notifications(
        &self,
        user_id: Option<UserId>,
    ) -> Result<Vec<Notification>, SchedulerError> {
        let tables = self.tables.read().await;
        Ok(tables
            .notifications
            .iter()
            .filter(|n| user_id.is_none_or(|id| n.user_id == id))
            .cloned()
            .collect())
    }

    async fn record_tick(
        &self,
        assignments: &[RoundAssignment],
        notifications: &[Notification],
    ) -> Result<TickWrite, SchedulerError> {
        let mut tables = self.tables.write().await;
        let mut written = TickWrite::default();

        for assignment in assignments {
            if tables.assignment_ids.insert(assignment.id) {
                tables.assignments.push(assignment.clone());
                written.assignments.push(assignment.clone());
            }
        }

        let announced = retain_recorded_tables(notifications, &written.assignments);
        for notification in announced {
            if tables.notification_ids.insert(notification.id) {
                tables.notifications.push(notification.clone());
                written.notifications.push(notification);
            }
        }
        Ok(written)
    }
}
