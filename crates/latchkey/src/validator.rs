use crate::{CredentialStore, Result, store::bounded};
use core::time::Duration;
use subtle::ConstantTimeEq;

/// Checks presented credentials against the store.
///
/// A credential stays valid for repeated use until its TTL elapses; a
/// successful validation does not consume it.
pub struct Validator<S> {
    store: S,
    store_timeout: Option<Duration>,
}

impl<S: CredentialStore> Validator<S> {
    pub const fn new(store: S) -> Self {
        Self {
            store,
            store_timeout: None,
        }
    }

    /// Bounds each store lookup by `store_timeout`.
    pub fn with_timeout(mut self, store_timeout: Option<Duration>) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// Returns whether `password` is the live password for `username`.
    ///
    /// An unknown or expired username is a negative result, not an error. The
    /// comparison runs in constant time with respect to the password bytes.
    ///
    /// # Errors
    ///
    /// Store failures are returned unchanged so callers can tell "rejected"
    /// apart from "could not check".
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub async fn validate(&self, username: &str, password: &str) -> Result<bool> {
        let Some(stored) = bounded(self.store_timeout, self.store.get(username)).await? else {
            return Ok(false);
        };
        Ok(stored.as_bytes().ct_eq(password.as_bytes()).into())
    }

    /// Checks that the store is reachable, under the same deadline as
    /// [`validate`](Self::validate).
    ///
    /// # Errors
    ///
    /// The store's error, or [`Error::StoreTimeout`](crate::Error::StoreTimeout).
    pub async fn ping(&self) -> Result<()> {
        bounded(self.store_timeout, self.store.ping()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, ManualClock, MemoryStore};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct BrokenStore;

    #[async_trait]
    impl CredentialStore for BrokenStore {
        async fn create(&self, _: &str, _: &str, _: Duration) -> Result<bool> {
            Err(Error::unavailable("broken pipe"))
        }

        async fn get(&self, _: &str) -> Result<Option<String>> {
            Err(Error::unavailable("broken pipe"))
        }

        async fn ping(&self) -> Result<()> {
            Err(Error::unavailable("broken pipe"))
        }
    }

    struct SilentStore;

    #[async_trait]
    impl CredentialStore for SilentStore {
        async fn create(&self, _: &str, _: &str, _: Duration) -> Result<bool> {
            core::future::pending().await
        }

        async fn get(&self, _: &str) -> Result<Option<String>> {
            core::future::pending().await
        }

        async fn ping(&self) -> Result<()> {
            core::future::pending().await
        }
    }

    fn validator() -> (Validator<Arc<MemoryStore<ManualClock>>>, ManualClock) {
        let clock = ManualClock::default();
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        store.try_insert("alice", "correct horse", Duration::from_millis(100));
        (Validator::new(store), clock)
    }

    #[tokio::test]
    async fn matching_password_is_valid_until_expiry() {
        let (validator, clock) = validator();
        assert!(validator.validate("alice", "correct horse").await.unwrap());
        // Reusable within the window.
        assert!(validator.validate("alice", "correct horse").await.unwrap());

        clock.advance(Duration::from_millis(100));
        assert!(!validator.validate("alice", "correct horse").await.unwrap());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let (validator, _) = validator();
        assert!(!validator.validate("alice", "correct horsf").await.unwrap());
        assert!(!validator.validate("alice", "correct").await.unwrap());
        assert!(!validator.validate("alice", "").await.unwrap());
    }

    #[tokio::test]
    async fn unknown_username_is_rejected_without_error() {
        let (validator, _) = validator();
        assert_eq!(validator.validate("mallory", "correct horse").await, Ok(false));
    }

    #[tokio::test]
    async fn store_failure_is_propagated() {
        let validator = Validator::new(BrokenStore);
        assert_eq!(
            validator.validate("alice", "correct horse").await,
            Err(Error::unavailable("broken pipe"))
        );
    }

    #[tokio::test]
    async fn ping_reports_store_state() {
        let (validator, _) = validator();
        assert_eq!(validator.ping().await, Ok(()));

        let validator = Validator::new(BrokenStore);
        assert_eq!(validator.ping().await, Err(Error::unavailable("broken pipe")));
    }

    #[tokio::test]
    async fn ping_is_bounded_by_the_store_timeout() {
        let limit = Duration::from_millis(20);
        let validator = Validator::new(SilentStore).with_timeout(Some(limit));
        assert_eq!(validator.ping().await, Err(Error::StoreTimeout(limit)));
    }
}
