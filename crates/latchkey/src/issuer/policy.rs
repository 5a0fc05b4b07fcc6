use crate::{Composition, Error, Result};
use core::time::Duration;

/// How long issued credentials stay valid unless configured otherwise.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

/// How many candidate usernames are tried before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Shortest accepted credential lifetime. Stores expire at millisecond
/// granularity.
pub const MIN_TTL: Duration = Duration::from_millis(1);

/// Longest accepted credential lifetime.
pub const MAX_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Fixed parameters of the issuance path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IssuancePolicy {
    /// Shape of generated usernames.
    pub username: Composition,
    /// Shape of generated passwords.
    pub password: Composition,
    /// Lifetime of every issued credential. Never renewed.
    pub ttl: Duration,
    /// Upper bound on username collisions tolerated per issuance.
    pub max_attempts: usize,
    /// Deadline applied to each store operation. `None` waits indefinitely.
    pub store_timeout: Option<Duration>,
}

impl Default for IssuancePolicy {
    fn default() -> Self {
        Self {
            username: Composition::default(),
            password: Composition::default(),
            ttl: DEFAULT_TTL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            store_timeout: None,
        }
    }
}

impl IssuancePolicy {
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub const fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub const fn with_store_timeout(mut self, store_timeout: Option<Duration>) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// Checks the policy once, before any request is served.
    ///
    /// # Errors
    ///
    /// - [`Error::Generation`] if either composition is infeasible.
    /// - [`Error::InvalidPolicy`] if `max_attempts` is zero or `ttl` falls
    ///   outside [`MIN_TTL`]..=[`MAX_TTL`].
    pub fn validate(&self) -> Result<()> {
        self.username.validate()?;
        self.password.validate()?;

        if self.ttl < MIN_TTL {
            return Err(Error::InvalidPolicy {
                reason: format!("ttl must be at least {MIN_TTL:?}"),
            });
        }
        if self.ttl > MAX_TTL {
            return Err(Error::InvalidPolicy {
                reason: format!("ttl must not exceed {MAX_TTL:?}"),
            });
        }
        if self.max_attempts == 0 {
            return Err(Error::InvalidPolicy {
                reason: "max_attempts must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}
