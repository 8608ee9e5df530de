//! Scheduler service: loads snapshots, runs ticks, writes results back.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::domain::round_clock::{self, EventPhase, RoundStatus};
use crate::domain::{
    Event, EventDraft, EventId, Notification, NotificationBus, PairingHistory, RoundAssignment,
    TableId, TickSnapshot, User, UserId, UserIndex, notification, process_tick,
};
use crate::error::SchedulerError;
use crate::persistence::SchedulerStore;

/// Net effect of one tick as written to the store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickReport {
    /// Instant the tick observed.
    pub ticked_at: DateTime<Utc>,
    /// Assignments newly written.
    pub assignments_written: usize,
    /// Notifications newly written and published.
    pub notifications_written: usize,
    /// Events skipped because their layout could not be seated.
    pub rejected_events: Vec<EventId>,
}

/// Repeat-pairing figures for one event.
#[derive(Debug, Clone, Serialize)]
pub struct PairingStats {
    /// Event the figures describe.
    pub event_id: EventId,
    /// Distinct rounds with a recorded seating.
    pub rounds_seated: usize,
    /// Pairs that shared a table at least once.
    pub distinct_pairs: usize,
    /// Pairs that shared a table more than once.
    pub repeated_pairs: usize,
    /// Most rounds any single pair shared.
    pub max_pair_count: u32,
}

/// Coordinates the store, the pure tick orchestrator, and the
/// [`NotificationBus`].
///
/// Ticks are serialized through an internal mutex that also owns the RNG
/// used for seating tie-breaks, so a driver tick and a manual tick never
/// compute from the same stale snapshot.
#[derive(Debug)]
pub struct SchedulerService {
    store: Arc<dyn SchedulerStore>,
    notification_bus: NotificationBus,
    tick_rng: Mutex<StdRng>,
}

impl SchedulerService {
    /// Creates a new `SchedulerService`.
    ///
    /// With `seed` set, seating tie-breaks are reproducible.
    #[must_use]
    pub fn new(
        store: Arc<dyn SchedulerStore>,
        notification_bus: NotificationBus,
        seed: Option<u64>,
    ) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            store,
            notification_bus,
            tick_rng: Mutex::new(rng),
        }
    }

    /// Returns a reference to the inner [`NotificationBus`].
    #[must_use]
    pub fn notification_bus(&self) -> &NotificationBus {
        &self.notification_bus
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SchedulerStore> {
        &self.store
    }

    /// Registers a participant.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidRequest`] for a blank name, or a
    /// store error.
    pub async fn register_user(&self, name: &str) -> Result<User, SchedulerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SchedulerError::InvalidRequest(
                "user name must not be empty".to_string(),
            ));
        }
        let user = self.store.create_user(name).await?;
        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Lists every registered participant.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn list_users(&self) -> Result<Vec<User>, SchedulerError> {
        self.store.list_users().await
    }

    /// Creates an event that has not started yet.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfiguration`] unless there are
    /// exactly four unique participants per unique table.
    pub async fn create_event(
        &self,
        name: &str,
        participant_ids: Vec<UserId>,
        table_ids: Vec<TableId>,
    ) -> Result<Event, SchedulerError> {
        let draft = EventDraft::new(name, participant_ids, table_ids)?;
        let event = self.store.create_event(draft).await?;
        tracing::info!(
            event_id = %event.id,
            participants = event.participant_ids.len(),
            tables = event.table_ids.len(),
            "event created"
        );
        Ok(event)
    }

    /// Starts an event so that round 1 begins at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::EventNotFound`] or
    /// [`SchedulerError::EventAlreadyStarted`].
    pub async fn start_event(
        &self,
        id: EventId,
        at: DateTime<Utc>,
    ) -> Result<Event, SchedulerError> {
        let event = self.store.mark_started(id, at).await?;
        tracing::info!(event_id = %id, started_at = %at, "event started");
        Ok(event)
    }

    /// Looks up an event.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::EventNotFound`] if it does not exist.
    pub async fn get_event(&self, id: EventId) -> Result<Event, SchedulerError> {
        self.store.get_event(id).await
    }

    /// Lists every event.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn list_events(&self) -> Result<Vec<Event>, SchedulerError> {
        self.store.list_events().await
    }

    /// Returns an event together with its round status and phase at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::EventNotFound`] if it does not exist.
    pub async fn event_status(
        &self,
        id: EventId,
        now: DateTime<Utc>,
    ) -> Result<(Event, RoundStatus, EventPhase), SchedulerError> {
        let event = self.store.get_event(id).await?;
        let status = round_clock::status(&event, now);
        let phase = round_clock::phase(&event, now);
        Ok((event, status, phase))
    }

    /// Recorded seatings of an event, optionally for a single round.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::EventNotFound`] if the event does not exist.
    pub async fn assignments(
        &self,
        event_id: EventId,
        round_id: Option<u32>,
    ) -> Result<Vec<RoundAssignment>, SchedulerError> {
        self.store.get_event(event_id).await?;
        let mut seated = self.store.list_assignments(Some(event_id)).await?;
        if let Some(round) = round_id {
            seated.retain(|a| a.round_id == round);
        }
        seated.sort_by_key(|a| (a.round_id, a.table_id));
        Ok(seated)
    }

    /// The table a user sits at in a given round.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AssignmentNotFound`] if the round is not
    /// seated yet or the user is not a participant.
    pub async fn user_assignment(
        &self,
        event_id: EventId,
        round_id: u32,
        user_id: UserId,
    ) -> Result<RoundAssignment, SchedulerError> {
        self.assignments(event_id, Some(round_id))
            .await?
            .into_iter()
            .find(|a| a.seats(user_id))
            .ok_or(SchedulerError::AssignmentNotFound {
                event_id,
                round_id,
                user_id,
            })
    }

    /// Repeat-pairing statistics over every seated round of an event.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::EventNotFound`] if the event does not exist.
    pub async fn pairing_stats(&self, event_id: EventId) -> Result<PairingStats, SchedulerError> {
        let seated = self.assignments(event_id, None).await?;
        let history = PairingHistory::from_rounds(&seated);
        let rounds: HashSet<u32> = seated.iter().map(|a| a.round_id).collect();
        Ok(PairingStats {
            event_id,
            rounds_seated: rounds.len(),
            distinct_pairs: history.distinct_pairs(),
            repeated_pairs: history.repeated_pairs(),
            max_pair_count: history.max_count(),
        })
    }

    /// A user's notification feed, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::UserNotFound`] if the user is not registered.
    pub async fn notifications_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Notification>, SchedulerError> {
        self.store.get_user(user_id).await?;
        let stored = self.store.list_notifications(Some(user_id)).await?;
        Ok(notification::notifications_for_user(&stored, user_id))
    }

    /// Runs one tick at `now`: snapshot, orchestrate, write back, publish.
    ///
    /// # Errors
    ///
    /// Returns a store error if loading or writing fails. Events whose
    /// layout is rejected do not fail the tick; they are listed in
    /// [`TickReport::rejected_events`].
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickReport, SchedulerError> {
        let mut rng = self.tick_rng.lock().await;

        let (events, assignments, notifications, users) = tokio::try_join!(
            self.store.list_events(),
            self.store.list_assignments(None),
            self.store.list_notifications(None),
            self.store.list_users(),
        )?;
        let outcome = {
            let directory = UserIndex::new(&users);
            let snapshot = TickSnapshot {
                events: &events,
                assignments: &assignments,
                notifications: &notifications,
                users: &directory,
            };
            process_tick(&snapshot, now, &mut *rng)
        };

        let written = self
            .store
            .record_tick(&outcome.new_assignments, &outcome.new_notifications)
            .await?;
        let dropped = outcome.new_assignments.len() - written.assignments.len();
        if dropped > 0 {
            tracing::warn!(dropped, "seating already recorded by a concurrent tick");
        }

        for n in &written.notifications {
            let _ = self.notification_bus.publish(n.clone());
        }

        let report = TickReport {
            ticked_at: now,
            assignments_written: written.assignments.len(),
            notifications_written: written.notifications.len(),
            rejected_events: outcome.rejected.iter().map(|(id, _)| *id).collect(),
        };
        if report.assignments_written > 0 || report.notifications_written > 0 {
            tracing::info!(
                assignments = report.assignments_written,
                notifications = report.notifications_written,
                "tick applied"
            );
        } else {
            tracing::debug!(events = events.len(), "tick found nothing to do");
        }
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::TimeDelta;

    use super::*;
    use crate::domain::NotificationKind;
    use crate::domain::round_clock::ROUND_DURATION_MS;
    use crate::persistence::{InMemoryStore, TickWrite};

    /// In-memory store that can fail its next tick write or serve tick
    /// snapshots without any recorded seatings.
    #[derive(Debug, Default)]
    struct ScriptedStore {
        inner: InMemoryStore,
        fail_next_record: AtomicBool,
        stale_assignments: AtomicBool,
    }

    #[async_trait]
    impl SchedulerStore for ScriptedStore {
        async fn create_user(&self, name: &str) -> Result<User, SchedulerError> {
            self.inner.create_user(name).await
        }

        async fn get_user(&self, id: UserId) -> Result<User, SchedulerError> {
            self.inner.get_user(id).await
        }

        async fn list_users(&self) -> Result<Vec<User>, SchedulerError> {
            self.inner.list_users().await
        }

        async fn create_event(&self, draft: EventDraft) -> Result<Event, SchedulerError> {
            self.inner.create_event(draft).await
        }

        async fn get_event(&self, id: EventId) -> Result<Event, SchedulerError> {
            self.inner.get_event(id).await
        }

        async fn list_events(&self) -> Result<Vec<Event>, SchedulerError> {
            self.inner.list_events().await
        }

        async fn mark_started(
            &self,
            id: EventId,
            at: DateTime<Utc>,
        ) -> Result<Event, SchedulerError> {
            self.inner.mark_started(id, at).await
        }

        async fn list_assignments(
            &self,
            event_id: Option<EventId>,
        ) -> Result<Vec<RoundAssignment>, SchedulerError> {
            if event_id.is_none() && self.stale_assignments.load(Ordering::SeqCst) {
                return Ok(Vec::new());
            }
            self.inner.list_assignments(event_id).await
        }

        async fn list_notifications(
            &self,
            user_id: Option<UserId>,
        ) -> Result<Vec<Notification>, SchedulerError> {
            self.inner.list_notifications(user_id).await
        }

        async fn record_tick(
            &self,
            assignments: &[RoundAssignment],
            notifications: &[Notification],
        ) -> Result<TickWrite, SchedulerError> {
            if self.fail_next_record.swap(false, Ordering::SeqCst) {
                return Err(SchedulerError::PersistenceError(
                    "connection reset".to_string(),
                ));
            }
            self.inner.record_tick(assignments, notifications).await
        }
    }

    fn service_over(store: &Arc<ScriptedStore>, seed: u64) -> SchedulerService {
        SchedulerService::new(
            Arc::clone(store) as Arc<dyn SchedulerStore>,
            NotificationBus::new(1000),
            Some(seed),
        )
    }

    fn make_service() -> SchedulerService {
        SchedulerService::new(
            Arc::new(InMemoryStore::new()),
            NotificationBus::new(1000),
            Some(7),
        )
    }

    async fn seeded_event(service: &SchedulerService, participants: usize) -> Event {
        let mut ids = Vec::with_capacity(participants);
        for i in 0..participants {
            let Ok(user) = service.register_user(&format!("Guest {i}")).await else {
                panic!("register user");
            };
            ids.push(user.id);
        }
        let tables = (1..=(participants / 4) as u64).map(TableId::new).collect();
        let Ok(event) = service.create_event("Mixer", ids, tables).await else {
            panic!("create event");
        };
        event
    }

    #[tokio::test]
    async fn blank_user_name_is_rejected() {
        let service = make_service();
        assert!(matches!(
            service.register_user("   ").await,
            Err(SchedulerError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn invalid_layout_is_rejected_at_creation() {
        let service = make_service();
        let result = service
            .create_event("Broken", vec![UserId::new(1)], vec![TableId::new(1)])
            .await;
        assert!(matches!(
            result,
            Err(SchedulerError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn tick_writes_and_publishes() {
        let service = make_service();
        let mut rx = service.notification_bus().subscribe();
        let event = seeded_event(&service, 8).await;
        let start = Utc::now();
        let Ok(_) = service.start_event(event.id, start).await else {
            panic!("start event");
        };

        let Ok(report) = service.tick(start).await else {
            panic!("tick");
        };
        assert_eq!(report.assignments_written, 2);
        assert_eq!(report.notifications_written, 8);

        let Ok(first) = rx.recv().await else {
            panic!("notification published");
        };
        assert!(first.text.starts_with("Round 1 is starting!"));
        assert!(first.text.contains("Guest"));

        let Ok(again) = service.tick(start).await else {
            panic!("tick");
        };
        assert_eq!(again.assignments_written, 0);
        assert_eq!(again.notifications_written, 0);
    }

    #[tokio::test]
    async fn queries_after_seating() {
        let service = make_service();
        let event = seeded_event(&service, 8).await;
        let start = Utc::now();
        let _ = service.start_event(event.id, start).await;
        let _ = service.tick(start).await;

        let Some(user) = event.participant_ids.first().copied() else {
            panic!("participants exist");
        };
        let Ok(table) = service.user_assignment(event.id, 1, user).await else {
            panic!("user seated");
        };
        assert!(table.seats(user));
        assert!(matches!(
            service.user_assignment(event.id, 2, user).await,
            Err(SchedulerError::AssignmentNotFound { .. })
        ));

        let Ok(feed) = service.notifications_for_user(user).await else {
            panic!("feed");
        };
        assert_eq!(feed.len(), 1);

        let Ok(stats) = service.pairing_stats(event.id).await else {
            panic!("stats");
        };
        assert_eq!(stats.rounds_seated, 1);
        assert_eq!(stats.distinct_pairs, 12);
        assert_eq!(stats.max_pair_count, 1);

        let Ok((_, status, phase)) = service
            .event_status(event.id, start + TimeDelta::milliseconds(ROUND_DURATION_MS))
            .await
        else {
            panic!("status");
        };
        assert_eq!(status.current_round, 2);
        assert_eq!(phase, EventPhase::Active { round: 2 });
    }

    #[tokio::test]
    async fn starting_twice_conflicts() {
        let service = make_service();
        let event = seeded_event(&service, 4).await;
        let now = Utc::now();
        assert!(service.start_event(event.id, now).await.is_ok());
        assert!(matches!(
            service.start_event(event.id, now).await,
            Err(SchedulerError::EventAlreadyStarted(_))
        ));
    }

    #[tokio::test]
    async fn unknown_ids_surface_not_found() {
        let service = make_service();
        assert!(matches!(
            service.assignments(EventId::new(99), None).await,
            Err(SchedulerError::EventNotFound(_))
        ));
        assert!(matches!(
            service.notifications_for_user(UserId::new(99)).await,
            Err(SchedulerError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn tick_runs_on_a_spawned_task() {
        let service = Arc::new(make_service());
        let event = seeded_event(&service, 4).await;
        let start = Utc::now();
        let Ok(_) = service.start_event(event.id, start).await else {
            panic!("start event");
        };

        let worker = Arc::clone(&service);
        let Ok(Ok(report)) = tokio::spawn(async move { worker.tick(start).await }).await else {
            panic!("spawned tick");
        };
        assert_eq!(report.assignments_written, 1);
        assert_eq!(report.notifications_written, 4);
    }

    #[tokio::test]
    async fn failed_write_is_retried_in_full() {
        let store = Arc::new(ScriptedStore::default());
        let service = service_over(&store, 7);
        let mut rx = service.notification_bus().subscribe();
        let event = seeded_event(&service, 8).await;
        let start = Utc::now();
        let Ok(_) = service.start_event(event.id, start).await else {
            panic!("start event");
        };

        store.fail_next_record.store(true, Ordering::SeqCst);
        assert!(matches!(
            service.tick(start).await,
            Err(SchedulerError::PersistenceError(_))
        ));
        assert!(rx.try_recv().is_err());
        let Ok(assignments) = store.list_assignments(None).await else {
            panic!("list assignments");
        };
        assert!(assignments.is_empty());

        let Ok(retry) = service.tick(start).await else {
            panic!("retry tick");
        };
        assert_eq!(retry.assignments_written, 2);
        assert_eq!(retry.notifications_written, 8);

        let Ok(stored) = store.list_notifications(None).await else {
            panic!("list notifications");
        };
        assert_eq!(stored.len(), 8);
        for _ in 0..8 {
            assert!(rx.try_recv().is_ok());
        }
    }

    #[tokio::test]
    async fn racing_tick_sends_no_second_announcement() {
        let store = Arc::new(ScriptedStore::default());
        let first = service_over(&store, 1);
        let second = service_over(&store, 2);
        let mut rx = second.notification_bus().subscribe();
        let event = seeded_event(&first, 8).await;
        let start = Utc::now();
        let Ok(_) = first.start_event(event.id, start).await else {
            panic!("start event");
        };
        let Ok(report) = first.tick(start).await else {
            panic!("first tick");
        };
        assert_eq!(report.assignments_written, 2);

        // The second tick reads a snapshot taken before the first one landed.
        store.stale_assignments.store(true, Ordering::SeqCst);
        let Ok(report) = second.tick(start).await else {
            panic!("second tick");
        };
        assert_eq!(report.assignments_written, 0);
        assert_eq!(report.notifications_written, 0);
        assert!(rx.try_recv().is_err());

        let Ok(stored) = store.inner.list_notifications(None).await else {
            panic!("list notifications");
        };
        assert_eq!(stored.len(), 8);
    }

    #[tokio::test]
    async fn partly_seated_round_announces_only_new_tables() {
        let store = Arc::new(ScriptedStore::default());
        let service = service_over(&store, 3);
        let mut rx = service.notification_bus().subscribe();
        let event = seeded_event(&service, 8).await;
        let start = Utc::now();
        let Ok(_) = service.start_event(event.id, start).await else {
            panic!("start event");
        };

        // Another writer has recorded table 1 of round 1 only.
        let taken = RoundAssignment::new(
            event.id,
            1,
            TableId::new(1),
            event.participant_ids.iter().take(4).copied().collect(),
        );
        let Ok(_) = store.inner.record_tick(&[taken], &[]).await else {
            panic!("record table 1");
        };
        store.stale_assignments.store(true, Ordering::SeqCst);

        let Ok(report) = service.tick(start).await else {
            panic!("tick");
        };
        assert_eq!(report.assignments_written, 1);
        assert_eq!(report.notifications_written, 4);

        let mut published = Vec::new();
        while let Ok(n) = rx.try_recv() {
            published.push(n);
        }
        assert_eq!(published.len(), 4);
        assert!(published.iter().all(|n| matches!(
            n.kind,
            NotificationKind::TableAssignment { table_id, .. } if table_id == TableId::new(2)
        )));
    }
}
