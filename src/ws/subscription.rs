//! Per-connection subscription manager.
//!
//! Tracks which users a WebSocket client follows and filters the
//! notification stream server-side.

use std::collections::BTreeSet;

use crate::domain::UserId;

/// The set of users a single WebSocket connection follows.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Followed user ids. Ignored while `subscribe_all` is set.
    user_ids: BTreeSet<UserId>,
    /// Whether the client follows every user (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds user ids to the subscription set; `wildcard` follows everyone.
    pub fn subscribe(&mut self, ids: &[UserId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.user_ids.extend(ids.iter().copied());
    }

    /// Removes user ids from the subscription set; `wildcard` clears the
    /// follow-everyone flag.
    pub fn unsubscribe(&mut self, ids: &[UserId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for id in ids {
            self.user_ids.remove(id);
        }
    }

    /// Returns `true` if notifications for `user_id` should be forwarded.
    #[must_use]
    pub fn matches(&self, user_id: UserId) -> bool {
        self.subscribe_all || self.user_ids.contains(&user_id)
    }

    /// Returns the number of explicitly followed users.
    #[must_use]
    pub fn count(&self) -> usize {
        self.user_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
