// Bounded per-user state.
//
// Both the spam detector and the escalation ledger keep one small record per
// user. Left alone those maps only ever grow, so this table caps the number of
// tracked users and forgets the ones that have been quiet for a while.

use crate::core::gateway::UserId;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

#[derive(Debug, Clone)]
struct TrackedEntry<T> {
    value: T,
    last_touched: DateTime<Utc>,
}

/// A concurrent map from user id to `T` with a size cap and an idle TTL.
///
/// Every read-modify-write happens inside a single DashMap entry guard, so two
/// events for the same user never interleave their updates. Callers must not
/// `.await` inside the closures passed here.
pub struct UserTable<T> {
    entries: DashMap<UserId, TrackedEntry<T>>,
    capacity: usize,
    idle_ttl: chrono::Duration,
}

impl<T: Default> UserTable<T> {
    pub fn new(capacity: usize, idle_ttl: chrono::Duration) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            idle_ttl,
        }
    }

    /// Run `f` against the user's record, creating it if needed.
    pub fn with_entry<R>(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut T) -> R,
    ) -> R {
        if !self.entries.contains_key(&user_id) && self.entries.len() >= self.capacity {
            self.make_room(now);
        }

        let mut entry = self.entries.entry(user_id).or_insert_with(|| TrackedEntry {
            value: T::default(),
            last_touched: now,
        });
        entry.last_touched = now;
        f(&mut entry.value)
    }

    /// Run `f` against an existing record only.
    pub fn with_existing<R>(&self, user_id: UserId, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.entries
            .get_mut(&user_id)
            .map(|mut entry| f(&mut entry.value))
    }

    /// Drop every record idle for longer than the TTL. Returns how many went.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let ttl = self.idle_ttl;
        self.entries.retain(|_, entry| now - entry.last_touched <= ttl);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.entries.contains_key(&user_id)
    }

    fn make_room(&self, now: DateTime<Utc>) {
        if self.sweep(now) > 0 && self.entries.len() < self.capacity {
            return;
        }

        // Still full of active users: evict whoever was touched longest ago.
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().last_touched)
            .map(|entry| *entry.key());

        if let Some(user_id) = oldest {
            self.entries.remove(&user_id);
            tracing::debug!(user_id, "Evicted least recently active user from tracking");
        }
    }
}

impl<T: Default + Clone> UserTable<T> {
    /// Snapshot a user's record.
    pub fn get(&self, user_id: UserId) -> Option<T> {
        self.entries.get(&user_id).map(|entry| entry.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_entries_are_created_lazily() {
        let table: UserTable<u32> = UserTable::new(10, chrono::Duration::seconds(60));
        assert!(table.get(1).is_none());

        table.with_entry(1, at(0), |count| *count += 1);
        table.with_entry(1, at(1), |count| *count += 1);

        assert_eq!(table.get(1), Some(2));
        assert_eq!(table.with_existing(2, |count| *count), None);
    }

    #[test]
    fn test_sweep_drops_idle_users() {
        let table: UserTable<u32> = UserTable::new(10, chrono::Duration::seconds(60));
        table.with_entry(1, at(0), |_| ());
        table.with_entry(2, at(50), |_| ());

        assert_eq!(table.sweep(at(100)), 1);
        assert!(!table.contains(1));
        assert!(table.contains(2));
    }

    #[test]
    fn test_full_table_evicts_least_recently_touched() {
        let table: UserTable<u32> = UserTable::new(2, chrono::Duration::seconds(3_600));
        table.with_entry(1, at(0), |_| ());
        table.with_entry(2, at(5), |_| ());
        // Touching user 1 again makes user 2 the oldest.
        table.with_entry(1, at(10), |_| ());

        table.with_entry(3, at(20), |_| ());

        assert_eq!(table.len(), 2);
        assert!(table.contains(1));
        assert!(!table.contains(2));
        assert!(table.contains(3));
    }

    #[test]
    fn test_full_table_prefers_sweeping_over_eviction() {
        let table: UserTable<u32> = UserTable::new(2, chrono::Duration::seconds(30));
        table.with_entry(1, at(0), |_| ());
        table.with_entry(2, at(100), |_| ());

        // User 1 is idle past the TTL, so it goes and user 2 survives.
        table.with_entry(3, at(110), |_| ());

        assert!(!table.contains(1));
        assert!(table.contains(2));
        assert!(table.contains(3));
    }
}
