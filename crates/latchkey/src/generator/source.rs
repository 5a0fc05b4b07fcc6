use crate::{Composition, GenerationError, compose};
use rand::rng;

/// A source of secret identifiers.
///
/// This abstraction lets the issuer draw usernames and passwords from the
/// thread-local CSPRNG in production, or from a scripted source in tests.
///
/// # Example
///
/// ```
/// use latchkey::{Composition, GenerationError, SecretSource};
///
/// struct Fixed;
/// impl SecretSource for Fixed {
///     fn generate(&self, _: &Composition) -> Result<String, GenerationError> {
///         Ok("fixed".to_string())
///     }
/// }
///
/// assert_eq!(Fixed.generate(&Composition::default()).unwrap(), "fixed");
/// ```
pub trait SecretSource: Send + Sync {
    /// Returns a fresh identifier shaped by `composition`.
    fn generate(&self, composition: &Composition) -> Result<String, GenerationError>;
}

/// A [`SecretSource`] backed by the thread-local RNG (`rand::rng()`).
///
/// The thread-local RNG is ChaCha-based, seeded from the OS and reseeded
/// periodically. The type is zero-sized and never stores the RNG, so it is
/// `Send + Sync` even though `ThreadRng` is not.
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadRngSource;

impl SecretSource for ThreadRngSource {
    fn generate(&self, composition: &Composition) -> Result<String, GenerationError> {
        compose(&mut rng(), composition)
    }
}
