//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::AuthError;

/// Wrap a future with a timeout, mapping expiry through `on_elapsed`.
///
/// The inner future is dropped when the bound is exceeded.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, AuthError>>,
    on_elapsed: impl FnOnce(Duration) -> AuthError,
) -> Result<T, AuthError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(on_elapsed(duration)),
    }
}
