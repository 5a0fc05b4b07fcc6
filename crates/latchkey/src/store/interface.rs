use crate::Result;
use async_trait::async_trait;
use core::time::Duration;
use std::sync::Arc;

/// TTL-bounded credential storage with an atomic create-if-absent primitive.
///
/// Uniqueness of usernames rests entirely on [`create`](Self::create) being
/// linearizable across every caller, including other processes sharing the
/// same backing store. Implementations must not emulate it with a
/// check-then-set sequence.
///
/// Implementations never retry internally and never report a connectivity
/// failure as "not found": those surface as
/// [`Error::StoreUnavailable`](crate::Error::StoreUnavailable).
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Stores `password` under `username` for `ttl`, only if no live entry
    /// exists for `username`.
    ///
    /// Returns `Ok(true)` if the entry was created and `Ok(false)` if a live
    /// entry already exists.
    async fn create(&self, username: &str, password: &str, ttl: Duration) -> Result<bool>;

    /// Returns the password stored under `username`, or `None` if there is no
    /// live entry (never created, or expired).
    async fn get(&self, username: &str) -> Result<Option<String>>;

    /// Checks that the backing store is reachable.
    async fn ping(&self) -> Result<()>;
}

#[async_trait]
impl<T: CredentialStore + ?Sized> CredentialStore for Arc<T> {
    async fn create(&self, username: &str, password: &str, ttl: Duration) -> Result<bool> {
        (**self).create(username, password, ttl).await
    }

    async fn get(&self, username: &str) -> Result<Option<String>> {
        (**self).get(username).await
    }

    async fn ping(&self) -> Result<()> {
        (**self).ping().await
    }
}
