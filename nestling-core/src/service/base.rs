//! Building blocks shared by every data service.
//!
//! None of these functions fail: a backend error, or a panic inside a backend
//! call, comes back as the `error` field of the returned result.

use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use crate::backend::BackendKind;
use crate::error::DataError;
use crate::result::{DualWriteResult, OpResult, ReadResult};

/// Runs a backend operation to completion, turning `Err` and panics into data.
pub(crate) async fn settle<T, F>(op: F) -> OpResult<T>
where
    F: Future<Output = Result<T, DataError>>,
{
    match AssertUnwindSafe(op).catch_unwind().await {
        Ok(result) => result.into(),
        Err(payload) => OpResult::err(DataError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Writes to two backends concurrently and waits for both.
///
/// Both futures are polled together; neither is awaited before the other
/// starts. `primary_kind` names the backend behind `primary` and is used for
/// logging only. The result's `success` is true exactly when `primary`
/// succeeded; the secondary outcome is reported but never changes it.
pub async fn dual_write<T, P, S>(primary_kind: BackendKind, primary: P, secondary: S) -> DualWriteResult<T>
where
    P: Future<Output = Result<T, DataError>>,
    S: Future<Output = Result<T, DataError>>,
{
    let (primary, secondary) = futures::join!(settle(primary), settle(secondary));
    let secondary_kind = primary_kind.other();

    match (&primary.error, &secondary.error) {
        (None, None) => {}
        (None, Some(err)) => tracing::warn!(
            primary = %primary_kind,
            secondary = %secondary_kind,
            error = %err,
            "dual write: secondary backend failed"
        ),
        (Some(err), None) => tracing::error!(
            primary = %primary_kind,
            secondary = %secondary_kind,
            error = %err,
            "dual write: primary backend failed, secondary succeeded"
        ),
        (Some(primary_err), Some(secondary_err)) => tracing::error!(
            primary = %primary_kind,
            secondary = %secondary_kind,
            primary_error = %primary_err,
            secondary_error = %secondary_err,
            "dual write: both backends failed"
        ),
    }

    DualWriteResult::new(primary, secondary)
}

/// Reads from whichever backend is active.
///
/// Only the thunk matching `active` is invoked; the other is dropped unused.
pub async fn read_from_active<T, R, RF, D, DF>(
    active: BackendKind,
    relational: R,
    document: D,
) -> ReadResult<T>
where
    R: FnOnce() -> RF,
    RF: Future<Output = Result<T, DataError>>,
    D: FnOnce() -> DF,
    DF: Future<Output = Result<T, DataError>>,
{
    let outcome = match active {
        BackendKind::Relational => settle(async move { relational().await }).await,
        BackendKind::Document => settle(async move { document().await }).await,
    };

    if let Some(err) = &outcome.error {
        tracing::error!(backend = %active, error = %err, "read failed");
    }

    ReadResult::from_op(outcome, active)
}

/// Backoff settings for [`with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    /// Delay before 0-indexed attempt `attempt`; zero for the first attempt.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32 << (attempt - 1).min(31);
        self.initial_delay.saturating_mul(factor)
    }
}

/// Re-runs `operation` with exponential backoff until it succeeds or the
/// attempts run out.
///
/// Returns the first successful result, or the last error. A policy with
/// `max_retries == 0` still makes one attempt.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut operation: F) -> OpResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DataError>>,
{
    let attempts = policy.max_retries.max(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            let delay = policy.delay_before(attempt);
            tracing::debug!(attempt = attempt + 1, ?delay, "retrying after backoff");
            tokio::time::sleep(delay).await;
        }

        let outcome = settle(async { operation().await }).await;
        if outcome.is_ok() {
            return outcome;
        }
        if let Some(err) = outcome.error {
            tracing::warn!(
                attempt = attempt + 1,
                max_attempts = attempts,
                error = %err,
                "operation failed"
            );
            last_error = Some(err);
        }
    }

    OpResult {
        data: None,
        error: last_error,
    }
}
