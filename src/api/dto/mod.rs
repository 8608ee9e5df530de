//! Data Transfer Objects for REST request/response serialization.
//!
//! Ids are serialized as plain numbers (users, events, tables) or UUID
//! strings (assignments, notifications).

pub mod common_dto;
pub mod event_dto;
pub mod notification_dto;
pub mod round_dto;
pub mod user_dto;

pub use common_dto::*;
pub use event_dto::*;
pub use notification_dto::*;
pub use round_dto::*;
pub use user_dto::*;
