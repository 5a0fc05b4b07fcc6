use crate::{Error, Result};
use core::{future::Future, time::Duration};
use tokio::time::timeout;

/// Runs a store operation, failing with [`Error::StoreTimeout`] if `limit`
/// elapses first. `None` leaves the operation unbounded.
///
/// The operation is dropped on timeout; whether it took effect in the store
/// is unknown.
pub(crate) async fn bounded<F, T>(limit: Option<Duration>, op: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => timeout(limit, op)
            .await
            .map_err(|_| Error::StoreTimeout(limit))?,
        None => op.await,
    }
}
