//! Cancellation helpers.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{ZoomError, ZoomResult};

/// Runs `operation` until it finishes or `cancel` fires, whichever is first.
///
/// Cancellation wins ties so a cancelled caller never starts new work.
pub async fn cancellable<T, F>(cancel: &CancellationToken, operation: F) -> ZoomResult<T>
where
    F: Future<Output = ZoomResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ZoomError::Cancelled),
        result = operation => result,
    }
}
