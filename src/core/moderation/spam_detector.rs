// Sliding-window message rate tracker.

use super::moderation_models::UserActivity;
use super::user_table::UserTable;
use crate::core::gateway::UserId;
use chrono::{DateTime, Utc};

/// Counts each user's messages inside a sliding window.
///
/// The detector only reports. Once it says the limit is exceeded the caller
/// clears the user's window, so one burst produces one trigger instead of one
/// per message until the window drains on its own.
pub struct SpamDetector {
    activity: UserTable<UserActivity>,
    window: chrono::Duration,
    limit: usize,
}

impl SpamDetector {
    pub fn new(window: chrono::Duration, limit: usize, activity: UserTable<UserActivity>) -> Self {
        Self {
            activity,
            window,
            limit,
        }
    }

    /// Record a message at `now` and report whether the user is over the limit.
    pub fn record_and_check(&self, user_id: UserId, now: DateTime<Utc>) -> bool {
        let window = self.window;
        let limit = self.limit;

        self.activity.with_entry(user_id, now, |activity| {
            activity.timestamps.push_back(now);
            activity.timestamps.retain(|t| now - *t <= window);
            activity.timestamps.len() >= limit
        })
    }

    /// Forget a user's recent messages after a trigger.
    pub fn clear(&self, user_id: UserId) {
        self.activity
            .with_existing(user_id, |activity| activity.timestamps.clear());
    }

    /// How many messages of this user are currently inside the window.
    #[allow(dead_code)]
    pub fn recent_count(&self, user_id: UserId) -> usize {
        self.activity
            .get(user_id)
            .map(|activity| activity.timestamps.len())
            .unwrap_or(0)
    }

    /// Forget users who have gone quiet. Returns how many were dropped.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        self.activity.sweep(now)
    }
}
