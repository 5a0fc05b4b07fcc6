//! # `latchkey`: ephemeral credential issuance and validation
//!
//! `latchkey` mints short-lived username/password pairs, reserves them in a
//! TTL-bounded store, and pairs each one with a backend endpoint picked from a
//! static pool. Holders of a pair can later prove it is still live.
//!
//! ## Guarantees
//!
//! - **Unique usernames**: uniqueness among live credentials rests on the
//!   store's atomic create-if-absent, so it holds across any number of
//!   issuers sharing one store.
//! - **Bounded lifetime**: credentials expire after a fixed TTL and are never
//!   renewed.
//! - **Unpredictable secrets**: identifiers come from a CSPRNG and honor
//!   per-class minimums.
//! - **Constant-time validation**: password comparison does not leak the
//!   matching prefix length.
//!
//! ## Example
//!
//! ```
//! use latchkey::{EndpointPool, IssuancePolicy, Issuer, MemoryStore, Validator};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> latchkey::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let pool = EndpointPool::new(["10.0.0.1:9000", "10.0.0.2:9000"]);
//! let issuer = Issuer::new(Arc::clone(&store), pool, IssuancePolicy::default())?;
//! let validator = Validator::new(store);
//!
//! let issued = issuer.issue().await?;
//! let credential = &issued.credential;
//! assert!(validator.validate(&credential.username, &credential.password).await?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! - `redis`: [`RedisStore`], a networked store using `SET NX PX`.
//! - `tracing`: debug-level spans and events for issuance and validation.

mod credential;
mod error;
mod generator;
mod issuer;
mod pool;
mod store;
mod time;
mod validator;

pub use crate::credential::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::issuer::*;
pub use crate::pool::*;
pub use crate::store::*;
pub use crate::time::*;
pub use crate::validator::*;
