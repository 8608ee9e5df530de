//! Service layer: scheduler orchestration around the store.
//!
//! [`SchedulerService`] loads snapshots from the store, runs the pure tick
//! orchestrator, writes the results back, and publishes new notifications
//! through the [`super::domain::NotificationBus`]. [`TickDriver`] calls it
//! on a fixed period.

pub mod demo;
pub mod driver;
pub mod scheduler_service;

pub use driver::TickDriver;
pub use scheduler_service::{PairingStats, SchedulerService, TickReport};
