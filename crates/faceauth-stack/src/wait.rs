//! Polling with exponential backoff and cancellation support.
//!
//! CloudFormation stack operations are asynchronous: the API call returns
//! immediately and the stack status has to be polled until it settles.

use anyhow::Result;
use backon::{BackoffBuilder, ExponentialBuilder};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Backoff and timeout for a polling loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay before the second check
    pub initial_delay: Duration,
    /// Cap for exponential growth
    pub max_delay: Duration,
    /// Total time allowed before giving up
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(15),
            timeout: Duration::from_secs(faceauth_common::defaults::DEFAULT_DEPLOY_TIMEOUT_SECS),
        }
    }
}

impl PollConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Poll `check` until it yields a value.
///
/// `check` returns `Ok(Some(value))` when done, `Ok(None)` to poll again, and
/// `Err` to abort immediately.
///
/// # Example
/// ```ignore
/// let status = poll_until(
///     PollConfig::default(),
///     Some(&cancel),
///     || async { Ok(stack_settled().await?) },
///     "stack rfl-dev",
/// )
/// .await?;
/// ```
pub async fn poll_until<T, F, Fut>(
    config: PollConfig,
    cancel: Option<&CancellationToken>,
    check: F,
    what: &str,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    let mut delays = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(2.0)
        .with_jitter()
        .without_max_times()
        .build();

    loop {
        attempts += 1;

        if cancel.is_some_and(|token| token.is_cancelled()) {
            anyhow::bail!("Wait for {} cancelled", what);
        }

        if start.elapsed() >= config.timeout {
            anyhow::bail!(
                "Timeout waiting for {} after {:?} ({} attempts)",
                what,
                config.timeout,
                attempts
            );
        }

        match check().await {
            Ok(Some(value)) => {
                debug!(target_resource = %what, attempts, "Wait complete");
                return Ok(value);
            }
            Ok(None) => {
                let delay = delays.next().unwrap_or(config.max_delay);
                debug!(
                    target_resource = %what,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Not settled, polling again"
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = async {
                        match cancel {
                            Some(token) => token.cancelled().await,
                            None => std::future::pending::<()>().await,
                        }
                    } => {
                        anyhow::bail!("Wait for {} cancelled", what);
                    }
                }
            }
            Err(e) => {
                warn!(target_resource = %what, error = %e, "Wait aborted");
                return Err(e);
            }
        }
    }
}
