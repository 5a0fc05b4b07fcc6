use crate::{CredentialStore, MonotonicClock, Result, TimeSource};
use async_trait::async_trait;
use core::time::Duration;
use parking_lot::Mutex;
use std::collections::HashMap;

struct Entry {
    password: String,
    expires_at: u64,
}

impl Entry {
    const fn is_live(&self, now: u64) -> bool {
        self.expires_at > now
    }
}

/// An in-process [`CredentialStore`].
///
/// Every operation runs under a single short critical section, which makes
/// [`create`](CredentialStore::create) linearizable for all callers sharing
/// the instance. Expiry is logical: entries carry a deadline on the store's
/// [`TimeSource`] and are treated as absent once it passes. Expired entries
/// are dropped when touched or by [`purge_expired`](Self::purge_expired);
/// there is no sweeper thread.
///
/// Only callers in the same process share this store. Deployments running
/// several instances need a networked backend.
pub struct MemoryStore<T = MonotonicClock> {
    entries: Mutex<HashMap<String, Entry>>,
    clock: T,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store driven by a [`MonotonicClock`].
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }
}

impl<T: TimeSource> MemoryStore<T> {
    /// Creates an empty store driven by `clock`.
    pub fn with_clock(clock: T) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Synchronous form of [`CredentialStore::create`].
    pub fn try_insert(&self, username: &str, password: &str, ttl: Duration) -> bool {
        let now = self.clock.current_millis();
        // Round a sub-millisecond ttl up, as `PX` does in the Redis store.
        let ttl = match u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX) {
            0 if !ttl.is_zero() => 1,
            ms => ms,
        };
        let mut entries = self.entries.lock();

        if entries.get(username).is_some_and(|entry| entry.is_live(now)) {
            return false;
        }

        entries.insert(
            username.to_owned(),
            Entry {
                password: password.to_owned(),
                expires_at: now.saturating_add(ttl),
            },
        );
        true
    }

    /// Synchronous form of [`CredentialStore::get`].
    pub fn lookup(&self, username: &str) -> Option<String> {
        let now = self.clock.current_millis();
        let mut entries = self.entries.lock();

        match entries.get(username) {
            Some(entry) if entry.is_live(now) => Some(entry.password.clone()),
            Some(_) => {
                entries.remove(username);
                None
            }
            None => None,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = self.clock.current_millis();
        self.entries
            .lock()
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.current_millis();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }
}

#[async_trait]
impl<T: TimeSource> CredentialStore for MemoryStore<T> {
    async fn create(&self, username: &str, password: &str, ttl: Duration) -> Result<bool> {
        Ok(self.try_insert(username, password, ttl))
    }

    async fn get(&self, username: &str) -> Result<Option<String>> {
        Ok(self.lookup(username))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use std::sync::Arc;

    const TTL: Duration = Duration::from_millis(100);

    fn store() -> (MemoryStore<ManualClock>, ManualClock) {
        let clock = ManualClock::default();
        (MemoryStore::with_clock(clock.clone()), clock)
    }

    #[tokio::test]
    async fn create_then_get_returns_password() {
        let (store, _) = store();
        assert!(store.create("alice", "secret", TTL).await.unwrap());
        assert_eq!(store.get("alice").await.unwrap().as_deref(), Some("secret"));
        assert_eq!(store.get("bob").await.unwrap(), None);
    }

    #[tokio::test]
    async fn create_refuses_live_key() {
        let (store, _) = store();
        assert!(store.create("alice", "first", TTL).await.unwrap());
        assert!(!store.create("alice", "second", TTL).await.unwrap());
        assert_eq!(store.get("alice").await.unwrap().as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn entries_expire_at_deadline() {
        let (store, clock) = store();
        store.create("alice", "secret", TTL).await.unwrap();

        clock.advance(Duration::from_millis(99));
        assert!(store.get("alice").await.unwrap().is_some());

        clock.advance(Duration::from_millis(1));
        assert_eq!(store.get("alice").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn expired_key_can_be_created_again() {
        let (store, clock) = store();
        store.create("alice", "old", TTL).await.unwrap();
        clock.advance(TTL);
        assert!(store.create("alice", "new", TTL).await.unwrap());
        assert_eq!(store.get("alice").await.unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn purge_drops_only_expired_entries() {
        let (store, clock) = store();
        store.try_insert("short", "a", Duration::from_millis(10));
        store.try_insert("long", "b", Duration::from_secs(60));
        clock.advance(Duration::from_millis(10));

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup("long").as_deref(), Some("b"));
    }

    #[test]
    fn sub_millisecond_ttl_rounds_up() {
        let (store, clock) = store();
        assert!(store.try_insert("alice", "secret", Duration::from_micros(500)));
        assert_eq!(store.lookup("alice").as_deref(), Some("secret"));

        clock.advance(Duration::from_millis(1));
        assert_eq!(store.lookup("alice"), None);
    }

    #[test]
    fn zero_ttl_entry_is_never_visible() {
        let (store, _) = store();
        assert!(store.try_insert("alice", "secret", Duration::ZERO));
        assert_eq!(store.lookup("alice"), None);
    }

    #[test]
    fn concurrent_creates_have_one_winner() {
        use std::thread::scope;

        const THREADS: usize = 16;

        let store = Arc::new(MemoryStore::new());
        let winners: usize = scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|i| {
                    let store = Arc::clone(&store);
                    s.spawn(move || store.try_insert("contended", &i.to_string(), TTL * 100))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| usize::from(h.join().unwrap()))
                .sum()
        });

        assert_eq!(winners, 1);
        assert_eq!(store.len(), 1);
    }
}
