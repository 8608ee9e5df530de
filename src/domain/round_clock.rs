//! Time-to-round state machine.
//!
//! Everything here is a pure function of an [`Event`] and a wall-clock
//! instant. Rounds are numbered from 1; round `n` covers
//! `[started_at + (n-1)·D, started_at + n·D)` where `D` is
//! [`ROUND_DURATION_MS`].

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use super::Event;

/// Length of one seating round (10 minutes).
pub const ROUND_DURATION_MS: i64 = 10 * 60 * 1000;

/// Number of rounds in every event.
pub const TOTAL_ROUNDS: u32 = 5;

/// Participants per table.
pub const SEATS_PER_TABLE: usize = 4;

/// Width of the round-end warning window before each round ends.
pub const ROUND_END_WARNING_MS: i64 = 60 * 1000;

/// Snapshot of where an event stands at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundStatus {
    /// Current round number. `0` when not started; `<= 0` before the start
    /// instant; greater than [`TOTAL_ROUNDS`] once the event is over.
    pub current_round: i64,
    /// `true` while `current_round` is within `1..=TOTAL_ROUNDS`.
    pub is_active: bool,
    /// `true` once every round has elapsed.
    pub is_completed: bool,
}

impl RoundStatus {
    /// Returns the current round as a schedulable round number, if active.
    #[must_use]
    pub fn active_round(&self) -> Option<u32> {
        if self.is_active {
            u32::try_from(self.current_round).ok()
        } else {
            None
        }
    }
}

/// Coarse lifecycle phase derived from [`RoundStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum EventPhase {
    /// `started_at` has not been set.
    NotStarted,
    /// A start instant is set but lies in the future.
    Scheduled,
    /// A round is in progress.
    Active {
        /// Round in progress.
        round: u32,
    },
    /// All rounds have elapsed.
    Completed,
}

/// Computes the round status of `event` at `now`.
#[must_use]
pub fn status(event: &Event, now: DateTime<Utc>) -> RoundStatus {
    let Some(started_at) = event.started_at else {
        return RoundStatus {
            current_round: 0,
            is_active: false,
            is_completed: false,
        };
    };

    let elapsed_ms = (now - started_at).num_milliseconds();
    let current_round = elapsed_ms.div_euclid(ROUND_DURATION_MS) + 1;

    RoundStatus {
        current_round,
        is_active: (1..=i64::from(TOTAL_ROUNDS)).contains(&current_round),
        is_completed: current_round > i64::from(TOTAL_ROUNDS),
    }
}

/// Computes the lifecycle phase of `event` at `now`.
#[must_use]
pub fn phase(event: &Event, now: DateTime<Utc>) -> EventPhase {
    let st = status(event, now);
    if event.started_at.is_none() {
        EventPhase::NotStarted
    } else if let Some(round) = st.active_round() {
        EventPhase::Active { round }
    } else if st.is_completed {
        EventPhase::Completed
    } else {
        EventPhase::Scheduled
    }
}

/// Instant at which `round_id` begins, or `None` if the event has not started.
#[must_use]
pub fn round_start(event: &Event, round_id: u32) -> Option<DateTime<Utc>> {
    let started_at = event.started_at?;
    let offset = (i64::from(round_id) - 1) * ROUND_DURATION_MS;
    Some(started_at + TimeDelta::milliseconds(offset))
}

/// Instant at which `round_id` ends, or `None` if the event has not started.
#[must_use]
pub fn round_end(event: &Event, round_id: u32) -> Option<DateTime<Utc>> {
    let started_at = event.started_at?;
    let offset = i64::from(round_id) * ROUND_DURATION_MS;
    Some(started_at + TimeDelta::milliseconds(offset))
}

/// Returns `true` when `now` lies in the warning window just before the end
/// of `round_id`.
#[must_use]
pub fn in_round_end_window(event: &Event, round_id: u32, now: DateTime<Utc>) -> bool {
    let Some(end) = round_end(event, round_id) else {
        return false;
    };
    let window_start = end - TimeDelta::milliseconds(ROUND_END_WARNING_MS);
    window_start <= now && now < end
}
