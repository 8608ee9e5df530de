//! Tick orchestrator: advances every event by one observation of the clock.
//!
//! A tick reads a [`TickSnapshot`] of everything already recorded and
//! returns only the records that are missing at `now`. It keeps no state
//! between calls, so calling it twice with the same snapshot and instant
//! yields nothing new the second time once the first result is stored.
//!
//! Concurrent ticks for the same event must be serialized by the caller.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::Rng;

use super::notification::{self, Notification, NotificationKind};
use super::round_clock::{self, TOTAL_ROUNDS};
use super::seating::generate_round_seating;
use super::user::UserDirectory;
use super::{Event, EventId, RoundAssignment};
use crate::error::SchedulerError;

/// Everything recorded so far, as seen by one tick.
#[derive(Clone, Copy)]
pub struct TickSnapshot<'a> {
    /// All events, started or not.
    pub events: &'a [Event],
    /// Every round assignment ever recorded.
    pub assignments: &'a [RoundAssignment],
    /// Every notification ever recorded.
    pub notifications: &'a [Notification],
    /// Display names for composing messages.
    pub users: &'a dyn UserDirectory,
}

impl std::fmt::Debug for TickSnapshot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickSnapshot")
            .field("events", &self.events.len())
            .field("assignments", &self.assignments.len())
            .field("notifications", &self.notifications.len())
            .finish_non_exhaustive()
    }
}

/// Net-new records produced by a tick. The caller persists and delivers them.
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// Seatings for rounds that just started.
    pub new_assignments: Vec<RoundAssignment>,
    /// Notifications to store and deliver.
    pub new_notifications: Vec<Notification>,
    /// Events skipped because their layout was rejected.
    pub rejected: Vec<(EventId, SchedulerError)>,
}

impl TickOutcome {
    /// Returns `true` if the tick produced no new records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new_assignments.is_empty() && self.new_notifications.is_empty()
    }

    fn absorb(&mut self, other: Self) {
        self.new_assignments.extend(other.new_assignments);
        self.new_notifications.extend(other.new_notifications);
        self.rejected.extend(other.rejected);
    }
}

/// Runs one tick over every event in the snapshot.
///
/// Events are independent: a rejected layout on one event is reported in
/// [`TickOutcome::rejected`] and does not stop the others.
pub fn process_tick<R: Rng + ?Sized>(
    snapshot: &TickSnapshot<'_>,
    now: DateTime<Utc>,
    rng: &mut R,
) -> TickOutcome {
    let sent: HashSet<NotificationKind> = snapshot.notifications.iter().map(|n| n.kind).collect();
    let mut outcome = TickOutcome::default();

    for event in snapshot.events {
        match advance_event(event, snapshot, &sent, now, rng) {
            Ok(step) => outcome.absorb(step),
            Err(err) => {
                tracing::warn!(event_id = %event.id, error = %err, "event skipped by tick");
                outcome.rejected.push((event.id, err));
            }
        }
    }

    outcome
}

/// Advances a single event.
///
/// `sent` holds the markers of every notification already recorded.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidConfiguration`] if the event's layout
/// cannot be seated.
pub fn advance_event<R: Rng + ?Sized>(
    event: &Event,
    snapshot: &TickSnapshot<'_>,
    sent: &HashSet<NotificationKind>,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<TickOutcome, SchedulerError> {
    let mut outcome = TickOutcome::default();
    let status = round_clock::status(event, now);

    if let Some(round_id) = status.active_round() {
        seat_round(event, round_id, snapshot, now, rng, &mut outcome)?;
        warn_round_end(event, round_id, sent, now, &mut outcome);
        log_missed_warning(event, round_id, sent, snapshot.assignments);
    } else if status.is_completed {
        complete_event(event, sent, now, &mut outcome);
    }

    Ok(outcome)
}

fn seat_round<R: Rng + ?Sized>(
    event: &Event,
    round_id: u32,
    snapshot: &TickSnapshot<'_>,
    now: DateTime<Utc>,
    rng: &mut R,
    outcome: &mut TickOutcome,
) -> Result<(), SchedulerError> {
    let already_seated = snapshot
        .assignments
        .iter()
        .any(|a| a.event_id == event.id && a.round_id == round_id);
    if already_seated {
        return Ok(());
    }
    let started = round_clock::round_start(event, round_id).is_some_and(|start| now >= start);
    if !started {
        return Ok(());
    }

    let prior: Vec<RoundAssignment> = snapshot
        .assignments
        .iter()
        .filter(|a| a.event_id == event.id && a.round_id < round_id)
        .cloned()
        .collect();

    let seated = generate_round_seating(
        event.id,
        round_id,
        &event.participant_ids,
        &event.table_ids,
        &prior,
        rng,
    )?;

    for table in &seated {
        for user_id in table.user_ids.iter().copied() {
            let tablemates: Vec<String> = table
                .tablemates_of(user_id)
                .map(|id| snapshot.users.name_or_placeholder(id))
                .collect();
            outcome.new_notifications.push(notification::table_assignment(
                user_id,
                event.id,
                round_id,
                table.table_id,
                &tablemates,
                now,
            ));
        }
    }

    tracing::info!(
        event_id = %event.id,
        round_id,
        tables = seated.len(),
        "round seated"
    );
    outcome.new_assignments.extend(seated);
    Ok(())
}

fn warn_round_end(
    event: &Event,
    round_id: u32,
    sent: &HashSet<NotificationKind>,
    now: DateTime<Utc>,
    outcome: &mut TickOutcome,
) {
    if !round_clock::in_round_end_window(event, round_id, now) {
        return;
    }
    let marker = NotificationKind::RoundEnd {
        event_id: event.id,
        round_id,
    };
    if sent.contains(&marker) {
        return;
    }

    outcome.new_notifications.extend(
        event
            .participant_ids
            .iter()
            .map(|user_id| notification::round_end(*user_id, event.id, round_id, now)),
    );
    tracing::info!(event_id = %event.id, round_id, "round-end warning issued");
}

/// A round-end window that passed without a tick is not replayed; note it.
fn log_missed_warning(
    event: &Event,
    round_id: u32,
    sent: &HashSet<NotificationKind>,
    assignments: &[RoundAssignment],
) {
    let Some(previous) = round_id.checked_sub(1).filter(|r| *r >= 1) else {
        return;
    };
    let current_unseated = !assignments
        .iter()
        .any(|a| a.event_id == event.id && a.round_id == round_id);
    let previous_seated = assignments
        .iter()
        .any(|a| a.event_id == event.id && a.round_id == previous);
    let marker = NotificationKind::RoundEnd {
        event_id: event.id,
        round_id: previous,
    };
    if current_unseated && previous_seated && !sent.contains(&marker) {
        tracing::debug!(
            event_id = %event.id,
            round_id = previous,
            "round-end window elapsed without a tick; warning not sent"
        );
    }
}

fn complete_event(
    event: &Event,
    sent: &HashSet<NotificationKind>,
    now: DateTime<Utc>,
    outcome: &mut TickOutcome,
) {
    let marker = NotificationKind::EventCompleted { event_id: event.id };
    if sent.contains(&marker) {
        return;
    }

    outcome.new_notifications.extend(
        event
            .participant_ids
            .iter()
            .map(|user_id| notification::event_completion(*user_id, event.id, now)),
    );
    tracing::info!(event_id = %event.id, rounds = TOTAL_ROUNDS, "event completed");
}

/// Keeps the notifications a store should record alongside `written`.
///
/// Table announcements survive only when their `(event, round, table)`
/// seating is among `written`; a seating that another writer recorded
/// first was announced by that writer. Other kinds pass through.
#[must_use]
pub fn retain_recorded_tables(
    notifications: &[Notification],
    written: &[RoundAssignment],
) -> Vec<Notification> {
    let tables: HashSet<_> = written
        .iter()
        .map(|a| (a.event_id, a.round_id, a.table_id))
        .collect();
    notifications
        .iter()
        .filter(|n| match n.kind {
            NotificationKind::TableAssignment {
                event_id,
                round_id,
                table_id,
            } => tables.contains(&(event_id, round_id, table_id)),
            NotificationKind::RoundEnd { .. } | NotificationKind::EventCompleted { .. } => true,
        })
        .cloned()
        .collect()
}
