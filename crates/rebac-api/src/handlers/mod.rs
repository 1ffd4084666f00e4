pub mod batch;
pub mod check;
pub mod health;
pub mod read;
pub mod write;

use crate::error::ApiError;
use std::future::Future;
use std::time::Duration;

/// Run a handler body under the request deadline. Expiry maps to a
/// retriable 408, never to deny; dropping the future propagates
/// cancellation into in-flight store and cache calls.
pub async fn with_deadline<T>(
    deadline: Duration,
    fut: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| ApiError::Timeout)?
}
