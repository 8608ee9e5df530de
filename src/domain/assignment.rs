//! Per-table, per-round seating records.

use serde::{Deserialize, Serialize};

use super::{AssignmentId, EventId, TableId, UserId};

/// The four participants seated at one table during one round.
///
/// Assignments are immutable history: once written they are only read back
/// to build the pairing history for later rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundAssignment {
    /// Derived from `(event_id, round_id, table_id)`.
    pub id: AssignmentId,
    /// Owning event.
    pub event_id: EventId,
    /// Round number, starting at 1.
    pub round_id: u32,
    /// Table the group sits at.
    pub table_id: TableId,
    /// Seated participants in seat order.
    pub user_ids: Vec<UserId>,
}

impl RoundAssignment {
    /// Creates an assignment with its derived id.
    #[must_use]
    pub fn new(event_id: EventId, round_id: u32, table_id: TableId, user_ids: Vec<UserId>) -> Self {
        Self {
            id: AssignmentId::derive(event_id, round_id, table_id),
            event_id,
            round_id,
            table_id,
            user_ids,
        }
    }

    /// Returns `true` if `user_id` sits at this table.
    #[must_use]
    pub fn seats(&self, user_id: UserId) -> bool {
        self.user_ids.contains(&user_id)
    }

    /// Everyone at this table except `user_id`, in seat order.
    pub fn tablemates_of(&self, user_id: UserId) -> impl Iterator<Item = UserId> + '_ {
        self.user_ids.iter().copied().filter(move |id| *id != user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tablemates_exclude_self() {
        let users: Vec<UserId> = (1..=4).map(UserId::new).collect();
        let a = RoundAssignment::new(EventId::new(1), 1, TableId::new(2), users);
        let mates: Vec<UserId> = a.tablemates_of(UserId::new(3)).collect();
        assert_eq!(mates, vec![UserId::new(1), UserId::new(2), UserId::new(4)]);
        assert!(a.seats(UserId::new(4)));
        assert!(!a.seats(UserId::new(5)));
    }

    #[test]
    fn id_matches_derivation() {
        let a = RoundAssignment::new(EventId::new(5), 3, TableId::new(8), Vec::new());
        assert_eq!(a.id, AssignmentId::derive(EventId::new(5), 3, TableId::new(8)));
    }
}
