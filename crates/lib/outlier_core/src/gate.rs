//! Provider gate: shared limiter for embedding and judgment calls.
//!
//! Every provider call in a scan goes through one gate: a semaphore caps how
//! many calls are in flight (excess calls queue), each call gets its own
//! timeout, and the scan's cancellation token aborts waiting and running
//! calls. A failed call is logged and reported as `None`; callers treat that
//! as "score unavailable".

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default maximum number of concurrent provider calls.
pub const DEFAULT_PROVIDER_CONCURRENCY: usize = 8;

/// Default timeout for a single provider call (30 seconds).
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ProviderGate {
    permits: Arc<Semaphore>,
    concurrency: usize,
    timeout: Duration,
    cancel: CancellationToken,
}

impl ProviderGate {
    pub fn new(concurrency: usize, timeout: Duration, cancel: CancellationToken) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            permits: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            timeout,
            cancel,
        }
    }

    /// Maximum number of calls in flight at once.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run one provider call under the gate.
    ///
    /// Returns `None` when the call failed, timed out, or the scan was
    /// cancelled.
    pub async fn run<T, E, F>(&self, label: &str, call: F) -> Option<T>
    where
        E: Display,
        F: Future<Output = Result<T, E>>,
    {
        let _permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(call = label, "provider call skipped: scan cancelled");
                return None;
            }
            permit = self.permits.acquire() => match permit {
                Ok(p) => p,
                Err(_) => return None,
            },
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(call = label, "provider call aborted: scan cancelled");
                None
            }
            outcome = tokio::time::timeout(self.timeout, call) => match outcome {
                Ok(Ok(value)) => Some(value),
                Ok(Err(e)) => {
                    warn!(call = label, "provider call failed: {e}");
                    None
                }
                Err(_) => {
                    warn!(
                        call = label,
                        "provider call timed out after {}s",
                        self.timeout.as_secs_f64()
                    );
                    None
                }
            },
        }
    }
}

impl Default for ProviderGate {
    fn default() -> Self {
        Self::new(
            DEFAULT_PROVIDER_CONCURRENCY,
            DEFAULT_PROVIDER_TIMEOUT,
            CancellationToken::new(),
        )
    }
}
