//! Error types for credential issuance and validation.
//!
//! Every fallible operation in this crate returns [`Error`]. The variants are
//! split by who has to act on them:
//!
//! - Configuration bugs, detected at construction time: [`Error::Generation`],
//!   [`Error::InvalidPolicy`], and (at issuance time) [`Error::NoEndpointConfigured`].
//! - Transient store failures the caller may retry: [`Error::StoreUnavailable`]
//!   and [`Error::StoreTimeout`]. See [`Error::is_retryable`].
//! - [`Error::IssuanceExhausted`]: the username collision bound was hit. Given
//!   the identifier entropy this points at a broken generator.

use core::time::Duration;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// A character-class composition that cannot produce an identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum GenerationError {
    /// The composition asks for a zero-length identifier.
    #[error("identifier length must be greater than 0")]
    EmptyLength,

    /// The per-class minimums do not fit in the requested length.
    #[error("class minimums require {required} characters but length is {length}")]
    Infeasible { required: usize, length: usize },
}

/// All errors produced while issuing or validating credentials.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The identifier composition is infeasible.
    #[error("invalid identifier composition: {0}")]
    Generation(#[from] GenerationError),

    /// The issuance policy is unusable (zero TTL, zero attempts).
    #[error("invalid issuance policy: {reason}")]
    InvalidPolicy { reason: String },

    /// The backing store could not be reached or rejected the command.
    #[error("credential store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    /// A store operation did not complete within its deadline. The outcome of
    /// the operation is unknown.
    #[error("credential store operation timed out after {0:?}")]
    StoreTimeout(Duration),

    /// Every attempt produced a username that already had a live entry.
    #[error("no unique username after {attempts} attempts")]
    IssuanceExhausted { attempts: usize },

    /// The endpoint pool is empty.
    #[error("no endpoint configured")]
    NoEndpointConfigured,
}

impl Error {
    /// Shorthand for [`Error::StoreUnavailable`].
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            reason: reason.into(),
        }
    }

    /// Returns `true` for store failures that a caller may reasonably retry.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. } | Self::StoreTimeout(_))
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Self::unavailable(err.to_string())
    }
}
