//! Background task that ticks the scheduler on a fixed period.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::SchedulerService;

#[derive(Debug)]
struct Running {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Periodic tick driver.
///
/// The first tick runs as soon as the driver starts, then one every
/// `period`. A tick that overruns delays the next one instead of bursting.
#[derive(Debug)]
pub struct TickDriver {
    service: Arc<SchedulerService>,
    period: Duration,
    running: Mutex<Option<Running>>,
}

impl TickDriver {
    /// Creates a stopped driver.
    #[must_use]
    pub fn new(service: Arc<SchedulerService>, period: Duration) -> Self {
        Self {
            service,
            period: period.max(Duration::from_millis(1)),
            running: Mutex::new(None),
        }
    }

    /// Tick period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Starts the background loop. Returns `false` if it was already running.
    pub async fn start(&self) -> bool {
        let mut running = self.running.lock().await;
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            return false;
        }
        let (shutdown, rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(Arc::clone(&self.service), self.period, rx));
        *running = Some(Running { shutdown, handle });
        tracing::info!(period_secs = self.period.as_secs(), "tick driver started");
        true
    }

    /// Stops the loop and waits for an in-flight tick to finish.
    /// Returns `false` if it was not running.
    pub async fn stop(&self) -> bool {
        let Some(running) = self.running.lock().await.take() else {
            return false;
        };
        let _ = running.shutdown.send(true);
        if let Err(err) = running.handle.await {
            tracing::warn!(error = %err, "tick driver task ended abnormally");
        }
        tracing::info!("tick driver stopped");
        true
    }

    /// Whether the background loop is live.
    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }
}

async fn run_loop(
    service: Arc<SchedulerService>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut timer = tokio::time::interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                if let Err(err) = service.tick(Utc::now()).await {
                    tracing::error!(error = %err, "scheduled tick failed");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{NotificationBus, TableId};
    use crate::persistence::InMemoryStore;

    #[tokio::test]
    async fn start_stop_lifecycle() {
        let service = Arc::new(SchedulerService::new(
            Arc::new(InMemoryStore::new()),
            NotificationBus::new(16),
            Some(1),
        ));
        let driver = TickDriver::new(Arc::clone(&service), Duration::from_secs(3600));

        assert!(!driver.is_running().await);
        assert!(driver.start().await);
        assert!(!driver.start().await);
        assert!(driver.is_running().await);
        assert!(driver.stop().await);
        assert!(!driver.stop().await);
        assert!(!driver.is_running().await);
    }

    #[tokio::test]
    async fn first_tick_runs_immediately() {
        let service = Arc::new(SchedulerService::new(
            Arc::new(InMemoryStore::new()),
            NotificationBus::new(64),
            Some(1),
        ));
        let mut ids = Vec::new();
        for name in ["Ada", "Ben", "Cy", "Di"] {
            let Ok(user) = service.register_user(name).await else {
                panic!("register user");
            };
            ids.push(user.id);
        }
        let Ok(event) = service
            .create_event("Quick", ids, vec![TableId::new(1)])
            .await
        else {
            panic!("create event");
        };
        let Ok(_) = service.start_event(event.id, Utc::now()).await else {
            panic!("start event");
        };

        let mut rx = service.notification_bus().subscribe();
        let driver = TickDriver::new(Arc::clone(&service), Duration::from_secs(3600));
        assert!(driver.start().await);

        let received = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        let Ok(Ok(notification)) = received else {
            panic!("expected a notification from the first tick");
        };
        assert!(notification.text.starts_with("Round 1 is starting!"));
        assert!(driver.stop().await);
    }
}
