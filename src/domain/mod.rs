//! Domain layer: records, the round clock, the seating optimizer, the
//! notification composer, and the tick orchestrator.
//!
//! Everything in this module except [`NotificationBus`] is a pure function
//! over values passed in. Persistence and delivery live in the service and
//! store layers.

pub mod assignment;
pub mod event;
pub mod ids;
pub mod notification;
pub mod notification_bus;
pub mod round_clock;
pub mod seating;
pub mod tick;
pub mod user;

pub use assignment::RoundAssignment;
pub use event::{Event, EventDraft};
pub use ids::{AssignmentId, EventId, NotificationId, TableId, UserId};
pub use notification::{Notification, NotificationKind};
pub use notification_bus::NotificationBus;
pub use round_clock::{EventPhase, RoundStatus};
pub use seating::{PairingHistory, generate_round_seating, has_users_previously_met};
pub use tick::{TickOutcome, TickSnapshot, process_tick, retain_recorded_tables};
pub use user::{User, UserDirectory, UserIndex};
