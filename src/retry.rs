//! Bounded exponential-backoff retry around a single upstream call.
//!
//! The executor retries only failures for which [`MangaError::is_retryable`]
//! holds. Client errors (4xx other than 429) fail on the first attempt. When
//! the attempt budget runs out the last failure is returned unchanged.
//!
//! Waiting goes through the [`Delay`] trait so tests can record backoff
//! durations instead of sleeping.
//!
//! # Example
//!
//! ```no_run
//! use manga_explainer::{MangaError, RetryPolicy, RetryingExecutor};
//!
//! # async fn example() -> Result<(), MangaError> {
//! let executor = RetryingExecutor::new(RetryPolicy::default());
//! let text = executor
//!     .execute(|attempt| async move {
//!         tracing::debug!("attempt {}", attempt);
//!         Ok::<_, MangaError>("done".to_string())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::errors::MangaError;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Total attempts made for one request, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Wait before the first retry; doubles on every further retry.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

/// Attempt budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }

    /// A policy that makes exactly one attempt.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay to wait after the failed attempt with 0-based index `attempt`:
    /// `initial_delay * 2^attempt`.
    ///
    /// ```
    /// use manga_explainer::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
    /// assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
    /// assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
    /// ```
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Something that can wait for a duration.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Waits on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Runs a fallible async operation under a [`RetryPolicy`].
#[derive(Clone)]
pub struct RetryingExecutor {
    policy: RetryPolicy,
    delay: Arc<dyn Delay>,
}

impl fmt::Debug for RetryingExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingExecutor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Default for RetryingExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl RetryingExecutor {
    /// Creates an executor that waits on the tokio timer.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_delay(policy, Arc::new(TokioDelay))
    }

    /// Creates an executor with a custom [`Delay`].
    #[must_use]
    pub fn with_delay(policy: RetryPolicy, delay: Arc<dyn Delay>) -> Self {
        Self { policy, delay }
    }

    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent.
    ///
    /// `operation` receives the 0-based attempt index.
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error, or the last retryable error once
    /// `max_attempts` attempts have failed.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, MangaError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, MangaError>>,
    {
        self.execute_with_cancel(&CancellationToken::new(), operation)
            .await
    }

    /// Like [`execute`](Self::execute), but checks `cancel` before every
    /// attempt. A cancellation observed during a backoff wait takes effect
    /// once the wait has finished.
    ///
    /// # Errors
    ///
    /// Returns [`MangaError::Cancelled`] if the token is cancelled before an
    /// attempt, otherwise as [`execute`](Self::execute).
    pub async fn execute_with_cancel<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, MangaError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, MangaError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                debug!("Cancelled before attempt {}", attempt + 1);
                return Err(MangaError::Cancelled);
            }

            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("Request succeeded after {} retry attempt(s)", attempt);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    if !e.is_retryable() {
                        debug!("Non-retryable error on attempt {}: {}", attempt + 1, e);
                        return Err(e);
                    }

                    if attempt + 1 >= max_attempts {
                        warn!(
                            "Giving up after {} attempt(s). Last error: {}",
                            max_attempts, e
                        );
                        return Err(e);
                    }

                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        "Retryable error (attempt {}/{}): {}. Waiting {:?} before retry",
                        attempt + 1,
                        max_attempts,
                        e,
                        delay
                    );
                    self.delay.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
