//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::NotificationBus;
use crate::service::{SchedulerService, TickDriver};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Scheduler service for all business logic.
    pub scheduler: Arc<SchedulerService>,
    /// Periodic tick driver.
    pub driver: Arc<TickDriver>,
    /// Notification bus for WebSocket subscriptions.
    pub notification_bus: NotificationBus,
}

impl AppState {
    /// Wires state around an existing service. The driver is created
    /// stopped.
    #[must_use]
    pub fn new(scheduler: Arc<SchedulerService>, tick_interval: std::time::Duration) -> Self {
        let notification_bus = scheduler.notification_bus().clone();
        let driver = Arc::new(TickDriver::new(Arc::clone(&scheduler), tick_interval));
        Self {
            scheduler,
            driver,
            notification_bus,
        }
    }
}
