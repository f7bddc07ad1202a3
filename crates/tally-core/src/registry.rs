//! The user registry document.
//!
//! Stored remotely as `{"users": [<id>, ...]}`. Any other top-level fields are
//! carried through untouched, because every write replaces the whole document.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::UserId;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default, deserialize_with = "unique_users")]
    users: Vec<UserId>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_users(users: impl IntoIterator<Item = UserId>) -> Self {
        let mut registry = Self::new();
        for user in users {
            registry.insert(user);
        }
        registry
    }

    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.users.contains(&user)
    }

    /// Append `user` unless already present. Returns `true` when added.
    pub fn insert(&mut self, user: UserId) -> bool {
        if self.contains(user) {
            return false;
        }
        self.users.push(user);
        true
    }
}

// `null` reads as empty; repeated ids keep their first position.
fn unique_users<'de, D>(deserializer: D) -> std::result::Result<Vec<UserId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<UserId>>::deserialize(deserializer)?.unwrap_or_default();
    let mut out: Vec<UserId> = Vec::with_capacity(raw.len());
    for user in raw {
        if !out.contains(&user) {
            out.push(user);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_appends_only_new_ids() {
        let mut registry = Registry::from_users([UserId(1), UserId(2)]);
        assert!(!registry.insert(UserId(1)));
        assert!(registry.insert(UserId(3)));
        assert_eq!(registry.users(), &[UserId(1), UserId(2), UserId(3)]);
    }

    #[test]
    fn missing_or_null_users_read_as_empty() {
        let registry: Registry = serde_json::from_value(json!({})).unwrap();
        assert!(registry.is_empty());

        let registry: Registry = serde_json::from_value(json!({ "users": null })).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicates_collapse_to_first_occurrence() {
        let registry: Registry =
            serde_json::from_value(json!({ "users": [5, 3, 5, 1, 3] })).unwrap();
        assert_eq!(registry.users(), &[UserId(5), UserId(3), UserId(1)]);
    }

    #[test]
    fn unknown_fields_survive_a_rewrite() {
        let mut registry: Registry =
            serde_json::from_value(json!({ "users": [1], "note": "keep me" })).unwrap();
        registry.insert(UserId(2));

        let written = serde_json::to_value(&registry).unwrap();
        assert_eq!(written, json!({ "users": [1, 2], "note": "keep me" }));
    }

    #[test]
    fn non_numeric_ids_are_rejected() {
        let parsed = serde_json::from_value::<Registry>(json!({ "users": ["abc"] }));
        assert!(parsed.is_err());
    }
}
