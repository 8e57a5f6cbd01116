//! Process-wide request spacing.

use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::ResolverError;

/// Enforces a minimum interval between the starts of consecutive requests.
///
/// The lock is held for the whole request, not only for the wait, so
/// callers released at the same moment still go out one at a time.
/// Dropping the guard on any exit path, cancellation included, releases
/// the gate for the next caller.
pub struct RateGate {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `request` once the interval since the previous request has passed.
    ///
    /// Returns [`ResolverError::Cancelled`] if `cancel` fires while queued,
    /// while waiting, or while the request is in flight.
    pub async fn run<F, Fut, T>(
        &self,
        cancel: &CancellationToken,
        request: F,
    ) -> Result<T, ResolverError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ResolverError>>,
    {
        let mut last = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ResolverError::Cancelled),
            guard = self.last.lock() => guard,
        };

        if let Some(previous) = *last {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ResolverError::Cancelled),
                _ = tokio::time::sleep_until(previous + self.interval) => {}
            }
        }

        *last = Some(Instant::now());

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ResolverError::Cancelled),
            result = request() => result,
        }
    }
}
