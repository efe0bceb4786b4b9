//! Cooldown bookkeeping
//!
//! Stores, per command, the instant at which each user may invoke it again.
//! Entries are never purged: a stamp in the past simply means "no cooldown".
//! Growth is bounded by the number of distinct (command, user) pairs.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Initial release, adapted from the sliding-window rate limiter

use dashmap::DashMap;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::commands::metadata::CommandMetadata;

/// Command name -> (user id -> eligible-again instant)
#[derive(Debug, Default)]
pub struct CooldownTracker {
    stamps: DashMap<String, HashMap<String, Instant>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the user may run the command now
    pub fn check(&self, user_id: &str, metadata: &CommandMetadata) -> bool {
        if !metadata.has_cooldown() {
            return true;
        }
        match self.eligible_at(user_id, &metadata.name) {
            Some(at) => Instant::now() >= at,
            None => true,
        }
    }

    /// Time left until the user may run the command again
    pub fn remaining(&self, user_id: &str, metadata: &CommandMetadata) -> Duration {
        self.eligible_at(user_id, &metadata.name)
            .map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }

    /// Start the cooldown for a user, now
    pub fn set(&self, user_id: &str, metadata: &CommandMetadata) {
        let at = Instant::now() + Duration::from_millis(metadata.cooldown_ms);
        self.stamps
            .entry(metadata.name.clone())
            .or_default()
            .insert(user_id.to_string(), at);
    }

    /// Forget every stamp
    pub fn clear(&self) {
        self.stamps.clear();
    }

    /// Number of (command, user) pairs tracked
    pub fn len(&self) -> usize {
        self.stamps.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn eligible_at(&self, user_id: &str, command: &str) -> Option<Instant> {
        self.stamps
            .get(command)
            .and_then(|users| users.get(user_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::metadata::{resolve_metadata, CommandOptions};
    use tokio::time::advance;

    fn meta(name: &str, cooldown_ms: u64) -> CommandMetadata {
        resolve_metadata("X", CommandOptions::new().name(name).cooldown_ms(cooldown_ms), None)
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_cooldown_always_passes() {
        let tracker = CooldownTracker::new();
        let ping = meta("ping", 0);

        tracker.set("user1", &ping);
        assert!(tracker.check("user1", &ping));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_blocks_until_elapsed() {
        let tracker = CooldownTracker::new();
        let roll = meta("roll", 5000);

        assert!(tracker.check("user1", &roll));
        assert_eq!(tracker.remaining("user1", &roll), Duration::ZERO);

        tracker.set("user1", &roll);
        assert!(!tracker.check("user1", &roll));
        assert_eq!(tracker.remaining("user1", &roll), Duration::from_millis(5000));

        advance(Duration::from_millis(1200)).await;
        assert!(!tracker.check("user1", &roll));
        assert_eq!(tracker.remaining("user1", &roll), Duration::from_millis(3800));

        advance(Duration::from_millis(3800)).await;
        assert!(tracker.check("user1", &roll));
        assert_eq!(tracker.remaining("user1", &roll), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_per_user_and_command() {
        let tracker = CooldownTracker::new();
        let roll = meta("roll", 1000);
        let flip = meta("flip", 1000);

        tracker.set("user1", &roll);

        assert!(!tracker.check("user1", &roll));
        assert!(tracker.check("user2", &roll));
        assert!(tracker.check("user1", &flip));
        assert_eq!(tracker.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entries_are_kept_but_ignored() {
        let tracker = CooldownTracker::new();
        let roll = meta("roll", 100);

        tracker.set("user1", &roll);
        advance(Duration::from_millis(500)).await;

        assert!(tracker.check("user1", &roll));
        assert_eq!(tracker.len(), 1);

        tracker.clear();
        assert!(tracker.is_empty());
    }
}
