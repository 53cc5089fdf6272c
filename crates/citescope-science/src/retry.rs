//! Bounded retry with a fixed back-off.
//!
//! A request is attempted at most `max_attempts` times. After each non-success
//! status the budget is checked first, then the classifier decides between
//! pausing for `delay` and giving up on the spot. There is no exponential growth.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::warn;

use crate::error::Result;

// ─── Pause ────────────────────────────────────────────────────────────────────

/// Suspension point used for retry back-off and politeness pauses.
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Records requested pauses without sleeping.
#[derive(Debug, Default)]
pub struct RecordingPause {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses
            .lock()
            .map(|pauses| pauses.clone())
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.pauses.lock().map(|pauses| pauses.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        if let Ok(mut pauses) = self.pauses.lock() {
            pauses.push(duration);
        }
    }
}

// ─── Policy ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Values below 1 behave as 1.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    fn budget(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(4, Duration::from_secs(5))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Fail,
}

/// Retry only on HTTP 429.
pub fn retry_on_rate_limit(status: StatusCode) -> RetryDecision {
    if status == StatusCode::TOO_MANY_REQUESTS {
        RetryDecision::Retry
    } else {
        RetryDecision::Fail
    }
}

/// Retry on any non-success status.
pub fn retry_always(_status: StatusCode) -> RetryDecision {
    RetryDecision::Retry
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    Success(T),
    /// Every attempt in the budget returned a non-success status.
    Exhausted { attempts: u32, last_status: StatusCode },
    /// The classifier refused to retry this status.
    Fatal(StatusCode),
}

impl<T> RetryOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Drive `attempt` under `policy`.
///
/// `attempt` yields `Ok(Ok(payload))` on success and `Ok(Err(status))` on a
/// non-success response. An outer `Err` is a transport fault and is returned
/// immediately without consuming the retry budget. Each failed attempt is
/// logged here; the final outcome is left for the caller to report.
pub async fn run_with_retry<T, F, Fut, C>(
    policy: &RetryPolicy,
    pause: &dyn Pause,
    context: &str,
    classify: C,
    mut attempt: F,
) -> Result<RetryOutcome<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<std::result::Result<T, StatusCode>>>,
    C: Fn(StatusCode) -> RetryDecision,
{
    let budget = policy.budget();
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let status = match attempt().await? {
            Ok(payload) => return Ok(RetryOutcome::Success(payload)),
            Err(status) => status,
        };

        warn!(context, status = status.as_u16(), attempt = attempts, "request failed");

        if attempts >= budget {
            return Ok(RetryOutcome::Exhausted {
                attempts,
                last_status: status,
            });
        }

        match classify(status) {
            RetryDecision::Fail => return Ok(RetryOutcome::Fatal(status)),
            RetryDecision::Retry => pause.pause(policy.delay).await,
        }
    }
}
