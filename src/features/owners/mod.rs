//! # Feature: Owners
//!
//! Users allowed to run owner-only commands. Managed at runtime and
//! independent of command reloads.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

use dashmap::DashSet;

#[derive(Debug, Default)]
pub struct OwnerSet {
    owners: DashSet<String>,
}

impl OwnerSet {
    pub fn new<I, S>(owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = Self::default();
        for owner in owners {
            set.add(owner);
        }
        set
    }

    /// Returns `false` if the user already was an owner
    pub fn add(&self, user_id: impl Into<String>) -> bool {
        self.owners.insert(user_id.into())
    }

    /// Returns `false` if the user was not an owner
    pub fn remove(&self, user_id: &str) -> bool {
        self.owners.remove(user_id).is_some()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.owners.contains(user_id)
    }

    /// Owner ids, sorted
    pub fn list(&self) -> Vec<String> {
        let mut owners: Vec<_> = self.owners.iter().map(|o| o.key().clone()).collect();
        owners.sort();
        owners
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_set_add_remove() {
        let owners = OwnerSet::new(["2", "1"]);
        assert_eq!(owners.list(), vec!["1", "2"]);

        assert!(owners.add("3"));
        assert!(!owners.add("3"));
        assert!(owners.contains("3"));

        assert!(owners.remove("1"));
        assert!(!owners.remove("1"));
        assert!(!owners.contains("1"));
        assert_eq!(owners.len(), 2);
    }

    #[test]
    fn test_empty_owner_set() {
        let owners = OwnerSet::new(Vec::<String>::new());
        assert!(owners.is_empty());
        assert!(!owners.contains("anyone"));
    }
}
