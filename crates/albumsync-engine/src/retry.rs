//! Bounded retry for remote-facing work
//!
//! Remote stores fail transiently; the supervisor re-runs an operation a
//! configured number of times with a fixed delay between attempts. Fatal
//! errors (invalid credentials, corrupt local state) are returned
//! immediately, because retrying them can only repeat the same failure.
//!
//! Re-running a whole album reconciliation is safe: every pass re-derives
//! its operations from the persisted ledger and a fresh remote listing, so
//! work completed by an earlier attempt becomes a no-op.

use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

use albumsync_core::config::RetryConfig;
use albumsync_core::domain::SyncError;

/// Re-runs fallible async operations with bounded, fixed-delay retry.
#[derive(Debug, Clone, Copy)]
pub struct RetrySupervisor {
    max_attempts: u32,
    delay: Duration,
}

impl RetrySupervisor {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            // A zero attempt budget would silently skip the operation.
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_secs(config.delay_secs),
        }
    }

    #[cfg(test)]
    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Runs `f` until it succeeds, fails fatally, or the attempt budget is
    /// exhausted. The final error is returned to the caller either way.
    pub async fn run<F, Fut, T>(&self, operation: &str, mut f: F) -> Result<T, SyncError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
    {
        let mut last_error: Option<SyncError> = None;

        for attempt in 1..=self.max_attempts {
            match f().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation, attempt, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_fatal() => {
                    error!(operation, error = %err, "fatal error, not retrying");
                    return Err(err);
                }
                Err(err) => {
                    if attempt < self.max_attempts {
                        warn!(
                            operation,
                            attempt,
                            delay_secs = self.delay.as_secs(),
                            error = %err,
                            "operation failed, retrying"
                        );
                        tokio::time::sleep(self.delay).await;
                    }
                    last_error = Some(err);
                }
            }
        }

        let err = last_error
            .unwrap_or_else(|| SyncError::Transient("retry budget exhausted".to_string()));
        error!(operation, attempts = self.max_attempts, error = %err, "operation failed permanently");
        Err(err)
    }
}
