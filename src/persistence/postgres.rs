//! PostgreSQL implementation of the store.
//!
//! Schema lives in `migrations/`. Assignment and notification ids are
//! primary keys and inserts use `ON CONFLICT (id) DO NOTHING`, so a second
//! tick racing on the same snapshot cannot duplicate a seating. A tick's
//! seatings and notifications share one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{SchedulerStore, TickWrite};
use crate::domain::{
    AssignmentId, Event, EventDraft, EventId, Notification, NotificationId, NotificationKind,
    RoundAssignment, TableId, User, UserId, retain_recorded_tables,
};
use crate::error::SchedulerError;

type EventRow = (i64, String, Option<DateTime<Utc>>, Vec<i64>, Vec<i64>);
type AssignmentRow = (Uuid, i64, i64, i64, Vec<i64>);
type NotificationRow = (Uuid, i64, String, serde_json::Value, DateTime<Utc>);

const EVENT_COLUMNS: &str = "id, name, started_at, participant_ids, table_ids";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), SchedulerError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| SchedulerError::PersistenceError(e.to_string()))
    }
}

fn to_db(raw: u64) -> Result<i64, SchedulerError> {
    i64::try_from(raw)
        .map_err(|_| SchedulerError::PersistenceError(format!("id {raw} exceeds BIGINT")))
}

fn from_db(raw: i64) -> Result<u64, SchedulerError> {
    u64::try_from(raw)
        .map_err(|_| SchedulerError::PersistenceError(format!("negative id {raw} in database")))
}

fn ids_to_db<T: Copy>(ids: &[T], raw: impl Fn(T) -> u64) -> Result<Vec<i64>, SchedulerError> {
    ids.iter().map(|id| to_db(raw(*id))).collect()
}

fn ids_from_db<T>(raw: Vec<i64>, wrap: impl Fn(u64) -> T) -> Result<Vec<T>, SchedulerError> {
    raw.into_iter().map(|v| from_db(v).map(&wrap)).collect()
}

fn event_from_row(
    (id, name, started_at, participant_ids, table_ids): EventRow,
) -> Result<Event, SchedulerError> {
    Ok(Event {
        id: EventId::new(from_db(id)?),
        name,
        started_at,
        participant_ids: ids_from_db(participant_ids, UserId::new)?,
        table_ids: ids_from_db(table_ids, TableId::new)?,
    })
}

fn assignment_from_row(
    (id, event_id, round_id, table_id, user_ids): AssignmentRow,
) -> Result<RoundAssignment, SchedulerError> {
    let round_id = u32::try_from(round_id)
        .map_err(|_| SchedulerError::PersistenceError(format!("invalid round {round_id}")))?;
    Ok(RoundAssignment {
        id: AssignmentId::from_uuid(id),
        event_id: EventId::new(from_db(event_id)?),
        round_id,
        table_id: TableId::new(from_db(table_id)?),
        user_ids: ids_from_db(user_ids, UserId::new)?,
    })
}

fn notification_from_row(
    (id, user_id, text, kind, created_at): NotificationRow,
) -> Result<Notification, SchedulerError> {
    let kind: NotificationKind = serde_json::from_value(kind)
        .map_err(|e| SchedulerError::PersistenceError(format!("bad notification kind: {e}")))?;
    Ok(Notification {
        id: NotificationId::from_uuid(id),
        user_id: UserId::new(from_db(user_id)?),
        text,
        kind,
        created_at,
    })
}

#[async_trait]
impl SchedulerStore for PostgresStore {
    async fn create_user(&self, name: &str) -> Result<User, SchedulerError> {
        let id = sqlx::query_scalar::<_, i64>("INSERT INTO users (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(User {
            id: UserId::new(from_db(id)?),
            name: name.to_string(),
        })
    }

    async fn get_user(&self, id: UserId) -> Result<User, SchedulerError> {
        let row = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM users WHERE id = $1")
            .bind(to_db(id.get())?)
            .fetch_optional(&self.pool)
            .await?;
        let (_, name) = row.ok_or(SchedulerError::UserNotFound(id))?;
        Ok(User { id, name })
    }

    async fn list_users(&self) -> Result<Vec<User>, SchedulerError> {
        let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|(id, name)| -> Result<User, SchedulerError> {
                Ok(User {
                    id: UserId::new(from_db(id)?),
                    name,
                })
            })
            .collect()
    }

    async fn create_event(&self, draft: EventDraft) -> Result<Event, SchedulerError> {
        let participants = ids_to_db(draft.participant_ids(), UserId::get)?;
        let tables = ids_to_db(draft.table_ids(), TableId::get)?;
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (name, participant_ids, table_ids) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(draft.name())
        .bind(&participants)
        .bind(&tables)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(event_id = id, "event row inserted");
        Ok(Event::from_draft(EventId::new(from_db(id)?), draft))
    }

    async fn get_event(&self, id: EventId) -> Result<Event, SchedulerError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(to_db(id.get())?)
        .fetch_optional(&self.pool)
        .await?;
        event_from_row(row.ok_or(SchedulerError::EventNotFound(id))?)
    }

    async fn list_events(&self) -> Result<Vec<Event>, SchedulerError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(event_from_row).collect()
    }

    async fn mark_started(&self, id: EventId, at: DateTime<Utc>) -> Result<Event, SchedulerError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "UPDATE events SET started_at = $2 WHERE id = $1 AND started_at IS NULL \
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(to_db(id.get())?)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => event_from_row(row),
            // Distinguish "unknown" from "already started".
            None => {
                let existing = self.get_event(id).await?;
                Err(SchedulerError::EventAlreadyStarted(existing.id))
            }
        }
    }

    async fn list_assignments(
        &self,
        event_id: Option<EventId>,
    ) -> Result<Vec<RoundAssignment>, SchedulerError> {
        let rows = if let Some(eid) = event_id {
            sqlx::query_as::<_, AssignmentRow>(
                "SELECT id, event_id, round_id, table_id, user_ids FROM round_assignments \
                 WHERE event_id = $1 ORDER BY round_id, table_id",
            )
            .bind(to_db(eid.get())?)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, AssignmentRow>(
                "SELECT id, event_id, round_id, table_id, user_ids FROM round_assignments \
                 ORDER BY event_id, round_id, table_id",
            )
            .fetch_all(&self.pool)
            .await
        }?;

        rows.into_iter().map(assignment_from_row).collect()
    }

    async fn list_notifications(
        &self,
        user_id: Option<UserId>,
    ) -> Result<Vec<Notification>, SchedulerError> {
        let rows = if let Some(uid) = user_id {
            sqlx::query_as::<_, NotificationRow>(
                "SELECT id, user_id, text, kind, created_at FROM notifications \
                 WHERE user_id = $1 ORDER BY created_at DESC",
            )
            .bind(to_db(uid.get())?)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, NotificationRow>(
                "SELECT id, user_id, text, kind, created_at FROM notifications ORDER BY created_at",
            )
            .fetch_all(&self.pool)
            .await
        }?;

        rows.into_iter().map(notification_from_row).collect()
    }

    async fn record_tick(
        &self,
        assignments: &[RoundAssignment],
        notifications: &[Notification],
    ) -> Result<TickWrite, SchedulerError> {
        let mut tx = self.pool.begin().await?;
        let mut written = TickWrite::default();

        for assignment in assignments {
            let result = sqlx::query(
                "INSERT INTO round_assignments (id, event_id, round_id, table_id, user_ids) \
                 VALUES ($1, $2, $3, $4, $5) ON CONFLICT (id) DO NOTHING",
            )
            .bind(assignment.id.as_uuid())
            .bind(to_db(assignment.event_id.get())?)
            .bind(i64::from(assignment.round_id))
            .bind(to_db(assignment.table_id.get())?)
            .bind(ids_to_db(&assignment.user_ids, UserId::get)?)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                written.assignments.push(assignment.clone());
            }
        }

        let announced = retain_recorded_tables(notifications, &written.assignments);
        for notification in announced {
            let kind = serde_json::to_value(notification.kind)
                .map_err(|e| SchedulerError::Internal(e.to_string()))?;
            let result = sqlx::query(
                "INSERT INTO notifications (id, user_id, text, kind, created_at) \
                 VALUES ($1, $2, $3, $4, $5) ON CONFLICT (id) DO NOTHING",
            )
            .bind(notification.id.as_uuid())
            .bind(to_db(notification.user_id.get())?)
            .bind(&notification.text)
            .bind(kind)
            .bind(notification.created_at)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                written.notifications.push(notification);
            }
        }

        // Dropping `tx` on any early return above rolls the whole tick back.
        tx.commit().await?;
        Ok(written)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn id_conversion_bounds() {
        assert!(to_db(u64::MAX).is_err());
        assert!(from_db(-1).is_err());
        let Ok(raw) = to_db(42) else {
            panic!("in range");
        };
        assert_eq!(raw, 42);
    }

    #[test]
    fn rows_map_to_records() {
        let row: EventRow = (3, "Mixer".to_string(), None, vec![1, 2, 3, 4], vec![9]);
        let Ok(event) = event_from_row(row) else {
            panic!("valid row");
        };
        assert_eq!(event.id, EventId::new(3));
        assert_eq!(event.table_ids, vec![TableId::new(9)]);

        let kind = NotificationKind::RoundEnd {
            event_id: EventId::new(3),
            round_id: 2,
        };
        let Ok(kind_json) = serde_json::to_value(kind) else {
            panic!("serializable");
        };
        let row: NotificationRow = (Uuid::new_v4(), 1, "text".to_string(), kind_json, Utc::now());
        let Ok(notification) = notification_from_row(row) else {
            panic!("valid row");
        };
        assert_eq!(notification.kind, kind);

        let row: AssignmentRow = (Uuid::new_v4(), 3, -1, 1, vec![1, 2, 3, 4]);
        assert!(assignment_from_row(row).is_err());
    }
}
