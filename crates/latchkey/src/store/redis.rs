use crate::{CredentialStore, Result};
use async_trait::async_trait;
use core::time::Duration;
use redis::aio::MultiplexedConnection;

/// A [`CredentialStore`] backed by Redis.
///
/// Creation uses `SET key value NX PX ttl`, which Redis executes atomically,
/// so uniqueness holds across every process sharing the server. Expiry is
/// Redis' native per-key TTL.
///
/// The connection is multiplexed: clones share one socket and are cheap.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Connects to the Redis server at `addr`.
    ///
    /// `addr` is either `host:port` or a full `redis://` / `rediss://` URL.
    /// Establishing the connection is retried up to `connect_retries` extra
    /// times with a linear backoff. Store operations themselves are never
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`](crate::Error::StoreUnavailable) if
    /// the address is malformed or every connection attempt fails.
    pub async fn connect(addr: &str, connect_retries: usize) -> Result<Self> {
        let client = redis::Client::open(connection_url(addr))?;
        let mut attempt = 0;
        loop {
            match client.get_multiplexed_async_connection().await {
                Ok(conn) => return Ok(Self { conn }),
                Err(_e) if attempt < connect_retries => {
                    attempt += 1;
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Redis connection attempt {attempt} failed: {_e}");
                    tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Wraps an already established connection.
    pub const fn from_connection(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

fn connection_url(addr: &str) -> String {
    if addr.starts_with("redis://") || addr.starts_with("rediss://") {
        addr.to_owned()
    } else {
        format!("redis://{addr}/")
    }
}

#[async_trait]
impl CredentialStore for RedisStore {
    async fn create(&self, username: &str, password: &str, ttl: Duration) -> Result<bool> {
        // PX rejects 0, and a sub-millisecond TTL would otherwise round to it.
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(username)
            .arg(password)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn get(&self, username: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let password: Option<String> = redis::cmd("GET").arg(username).query_async(&mut conn).await?;
        Ok(password)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_address_becomes_url() {
        assert_eq!(connection_url("10.0.0.5:6379"), "redis://10.0.0.5:6379/");
    }

    #[test]
    fn urls_pass_through() {
        assert_eq!(connection_url("rediss://cache:6380/2"), "rediss://cache:6380/2");
        assert_eq!(connection_url("redis://cache/"), "redis://cache/");
    }

    #[tokio::test]
    async fn malformed_address_is_store_unavailable() {
        let err = RedisStore::connect("redis://[::1:6379", 0).await.err().unwrap();
        assert!(err.is_retryable());
    }

    // Run with `cargo test -p latchkey --features redis -- --ignored`.
    #[tokio::test]
    #[ignore = "needs a Redis server at REDIS_ADDR"]
    async fn set_nx_px_against_live_server() {
        let addr = std::env::var("REDIS_ADDR").unwrap_or_else(|_| "127.0.0.1:6379".to_owned());
        let store = RedisStore::connect(&addr, 0).await.unwrap();
        store.ping().await.unwrap();

        let key = format!("latchkey-test-{:016x}", rand::random::<u64>());
        let ttl = Duration::from_millis(200);

        assert!(store.create(&key, "first", ttl).await.unwrap());
        assert!(!store.create(&key, "second", ttl).await.unwrap());
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("first"));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(store.get(&key).await.unwrap(), None);
        assert!(store.create(&key, "third", ttl).await.unwrap());
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("third"));
    }
}
