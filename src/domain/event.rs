//! Mixing event records.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::round_clock::SEATS_PER_TABLE;
use super::{EventId, TableId, UserId};
use crate::error::SchedulerError;

/// Validated input for creating an event. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    name: String,
    participant_ids: Vec<UserId>,
    table_ids: Vec<TableId>,
}

impl EventDraft {
    /// Validates the seating layout of a new event.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfiguration`] when the name is
    /// blank, there are no tables, ids repeat, or the participant count is
    /// not exactly four per table.
    pub fn new(
        name: impl Into<String>,
        participant_ids: Vec<UserId>,
        table_ids: Vec<TableId>,
    ) -> Result<Self, SchedulerError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SchedulerError::InvalidConfiguration(
                "event name must not be empty".to_string(),
            ));
        }
        if table_ids.is_empty() {
            return Err(SchedulerError::InvalidConfiguration(
                "an event needs at least one table".to_string(),
            ));
        }
        check_seat_count(participant_ids.len(), table_ids.len())?;

        let unique_users: HashSet<_> = participant_ids.iter().collect();
        if unique_users.len() != participant_ids.len() {
            return Err(SchedulerError::InvalidConfiguration(
                "participant ids must be unique".to_string(),
            ));
        }
        let unique_tables: HashSet<_> = table_ids.iter().collect();
        if unique_tables.len() != table_ids.len() {
            return Err(SchedulerError::InvalidConfiguration(
                "table ids must be unique".to_string(),
            ));
        }

        Ok(Self {
            name,
            participant_ids,
            table_ids,
        })
    }

    /// Event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Participants in seating order.
    #[must_use]
    pub fn participant_ids(&self) -> &[UserId] {
        &self.participant_ids
    }

    /// Tables in seating order.
    #[must_use]
    pub fn table_ids(&self) -> &[TableId] {
        &self.table_ids
    }
}

/// Rejects layouts that do not seat exactly [`SEATS_PER_TABLE`] per table.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidConfiguration`] on a mismatch.
pub fn check_seat_count(participants: usize, tables: usize) -> Result<(), SchedulerError> {
    if Some(participants) == tables.checked_mul(SEATS_PER_TABLE) {
        Ok(())
    } else {
        Err(SchedulerError::InvalidConfiguration(format!(
            "{participants} participants cannot be seated {SEATS_PER_TABLE} per table at {tables} tables"
        )))
    }
}

/// A multi-round mixing event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Store-issued identifier.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Start of round 1; `None` until the event is started.
    pub started_at: Option<DateTime<Utc>>,
    /// Participants, ordered and unique.
    pub participant_ids: Vec<UserId>,
    /// Tables, ordered and unique.
    pub table_ids: Vec<TableId>,
}

impl Event {
    /// Materializes a validated draft under a store-issued id.
    #[must_use]
    pub fn from_draft(id: EventId, draft: EventDraft) -> Self {
        Self {
            id,
            name: draft.name,
            started_at: None,
            participant_ids: draft.participant_ids,
            table_ids: draft.table_ids,
        }
    }

    /// Returns `true` once a start instant has been set.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Returns a copy of this event starting at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::EventAlreadyStarted`] if a start instant is
    /// already set.
    pub fn started(&self, at: DateTime<Utc>) -> Result<Self, SchedulerError> {
        if self.is_started() {
            return Err(SchedulerError::EventAlreadyStarted(self.id));
        }
        Ok(Self {
            started_at: Some(at),
            ..self.clone()
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn users(n: u64) -> Vec<UserId> {
        (1..=n).map(UserId::new).collect()
    }

    fn tables(n: u64) -> Vec<TableId> {
        (1..=n).map(TableId::new).collect()
    }

    #[test]
    fn draft_accepts_four_per_table() {
        let draft = EventDraft::new("December mixer", users(8), tables(2));
        assert!(draft.is_ok());
    }

    #[test]
    fn draft_rejects_uneven_layout() {
        let result = EventDraft::new("Uneven", users(7), tables(2));
        assert!(matches!(
            result,
            Err(SchedulerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn draft_rejects_duplicates() {
        let mut participants = users(3);
        participants.push(UserId::new(1));
        let result = EventDraft::new("Dupes", participants, tables(1));
        assert!(result.is_err());

        let result = EventDraft::new("Dupes", users(8), vec![TableId::new(1), TableId::new(1)]);
        assert!(result.is_err());
    }

    #[test]
    fn draft_rejects_blank_name_and_no_tables() {
        assert!(EventDraft::new("  ", users(4), tables(1)).is_err());
        assert!(EventDraft::new("Empty", Vec::new(), Vec::new()).is_err());
    }

    #[test]
    fn start_sets_instant_once() {
        let Ok(draft) = EventDraft::new("Start", users(4), tables(1)) else {
            panic!("valid draft");
        };
        let event = Event::from_draft(EventId::new(3), draft);
        assert!(!event.is_started());

        let now = Utc::now();
        let Ok(started) = event.started(now) else {
            panic!("first start succeeds");
        };
        assert_eq!(started.started_at, Some(now));
        assert!(!event.is_started(), "input is not mutated");

        assert!(matches!(
            started.started(now),
            Err(SchedulerError::EventAlreadyStarted(_))
        ));
    }
}
