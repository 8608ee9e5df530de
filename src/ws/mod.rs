//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The endpoint at `/ws` pushes every newly stored notification addressed
//! to the users a client has subscribed to.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
