//! Participants and the display-name lookup used when composing messages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::UserId;

/// A registered participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Directory-issued identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
}

/// Resolves participant ids to display names.
///
/// A missing entry is not an error; callers substitute [`placeholder_name`].
pub trait UserDirectory: Send + Sync {
    /// Returns the display name for `id`, if known.
    fn display_name(&self, id: UserId) -> Option<&str>;

    /// Returns the display name for `id`, or the placeholder label.
    fn name_or_placeholder(&self, id: UserId) -> String {
        self.display_name(id)
            .map_or_else(|| placeholder_name(id), str::to_string)
    }
}

/// Label used for participants without a directory entry.
#[must_use]
pub fn placeholder_name(id: UserId) -> String {
    format!("User {id}")
}

impl UserDirectory for HashMap<UserId, String> {
    fn display_name(&self, id: UserId) -> Option<&str> {
        self.get(&id).map(String::as_str)
    }
}

/// Directory indexed from a list of [`User`] records.
#[derive(Debug, Clone, Default)]
pub struct UserIndex {
    names: HashMap<UserId, String>,
}

impl UserIndex {
    /// Indexes the given users by id. Later duplicates win.
    #[must_use]
    pub fn new(users: &[User]) -> Self {
        Self {
            names: users.iter().map(|u| (u.id, u.name.clone())).collect(),
        }
    }

    /// Number of indexed users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no users are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl UserDirectory for UserIndex {
    fn display_name(&self, id: UserId) -> Option<&str> {
        self.names.display_name(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_names() {
        let index = UserIndex::new(&[User {
            id: UserId::new(1),
            name: "Alice Anderson".to_string(),
        }]);
        assert_eq!(index.name_or_placeholder(UserId::new(1)), "Alice Anderson");
        assert_eq!(index.name_or_placeholder(UserId::new(2)), "User 2");
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn hashmap_is_a_directory() {
        let mut map = HashMap::new();
        map.insert(UserId::new(7), "Grace".to_string());
        assert_eq!(map.display_name(UserId::new(7)), Some("Grace"));
        assert_eq!(map.display_name(UserId::new(8)), None);
    }
}
