//! Credential issuance.
//!
//! [`Issuer`] mints a credential by generating a candidate pair and asking the
//! store to create it atomically. The store's answer is the only source of
//! truth for uniqueness: there is no existence pre-check, since a
//! check-then-create sequence races against every other issuer sharing the
//! store.
//!
//! ## Failure handling
//!
//! - A collision (`create` returned `false`) discards the candidate and tries
//!   a fresh one, up to [`IssuancePolicy::max_attempts`].
//! - A store error or timeout is returned immediately. A timed-out `create`
//!   may still have succeeded, so it is never retried.
//! - An empty endpoint pool is reported after the credential was created. The
//!   credential is not rolled back; it expires unused.

mod policy;

pub use policy::*;

use crate::{
    Credential, CredentialStore, EndpointPool, Error, Issued, Result, SecretSource,
    ThreadRngSource, store::bounded,
};
use std::time::SystemTime;

/// Mints unique, TTL-bounded credentials.
pub struct Issuer<S, G = ThreadRngSource> {
    store: S,
    pool: EndpointPool,
    policy: IssuancePolicy,
    source: G,
}

impl<S: CredentialStore> Issuer<S> {
    /// Creates an issuer drawing secrets from the thread-local CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns the error from [`IssuancePolicy::validate`].
    pub fn new(store: S, pool: EndpointPool, policy: IssuancePolicy) -> Result<Self> {
        Self::with_source(store, pool, policy, ThreadRngSource)
    }
}

impl<S: CredentialStore, G: SecretSource> Issuer<S, G> {
    /// Creates an issuer drawing secrets from `source`.
    ///
    /// # Errors
    ///
    /// Returns the error from [`IssuancePolicy::validate`].
    pub fn with_source(
        store: S,
        pool: EndpointPool,
        policy: IssuancePolicy,
        source: G,
    ) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            store,
            pool,
            policy,
            source,
        })
    }

    pub const fn policy(&self) -> &IssuancePolicy {
        &self.policy
    }

    pub const fn pool(&self) -> &EndpointPool {
        &self.pool
    }

    /// Mints a credential and pairs it with an endpoint from the pool.
    ///
    /// # Errors
    ///
    /// - [`Error::StoreUnavailable`] / [`Error::StoreTimeout`] from the store.
    /// - [`Error::IssuanceExhausted`] after `max_attempts` collisions.
    /// - [`Error::NoEndpointConfigured`] if the pool is empty.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub async fn issue(&self) -> Result<Issued> {
        for _attempt in 1..=self.policy.max_attempts {
            let username = self.source.generate(&self.policy.username)?;
            let password = self.source.generate(&self.policy.password)?;

            let created = bounded(
                self.policy.store_timeout,
                self.store.create(&username, &password, self.policy.ttl),
            )
            .await?;

            if !created {
                #[cfg(feature = "tracing")]
                tracing::debug!("Username collision on attempt {_attempt}, retrying");
                continue;
            }

            let endpoint = self.pool.pick()?.to_owned();
            let credential = Credential {
                username,
                password,
                expires_at: SystemTime::now() + self.policy.ttl,
            };
            return Ok(Issued {
                credential,
                endpoint,
            });
        }

        Err(Error::IssuanceExhausted {
            attempts: self.policy.max_attempts,
        })
    }
}
