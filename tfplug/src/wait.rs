//! Generic state-change waiter
//!
//! `StateChangeConf` polls a refresh function until the remote object reports
//! one of the target statuses. Statuses in the pending set keep the loop going,
//! anything else ends it with `WaitError::UnexpectedState`.
//!
//! ```ignore
//! let topic = StateChangeConf::new(|| async { refresh_topic(&client).await })
//!     .pending(&["CONFIGURING"])
//!     .target(&["ACTIVE"])
//!     .min_timeout(Duration::from_secs(2))
//!     .timeout(Duration::from_secs(300))
//!     .wait_for_state(&ctx)
//!     .await?;
//! ```

use crate::context::Context;
use std::future::Future;
use std::time::Duration;

/// One refresh observation: the object (None when it does not exist yet) and
/// its status string.
pub type RefreshResult<T, E> = Result<(Option<T>, String), E>;

const DEFAULT_NOT_FOUND_CHECKS: usize = 20;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

#[derive(Debug, thiserror::Error)]
pub enum WaitError<E> {
    #[error("{0}")]
    Refresh(E),

    #[error("timeout while waiting for state to become '{target}' (last state: '{last_state}', timeout: {timeout:?})")]
    Timeout {
        last_state: String,
        target: String,
        timeout: Duration,
    },

    #[error("unexpected state '{state}', wanted target '{target}'")]
    UnexpectedState { state: String, target: String },

    #[error("couldn't find resource ({checks} retries)")]
    NotFound { checks: usize },

    #[error("wait cancelled")]
    Cancelled,
}

impl<E> WaitError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }

    /// Map the refresh error type, keeping every other variant
    pub fn map_refresh<F, O>(self, f: F) -> WaitError<O>
    where
        F: FnOnce(E) -> O,
    {
        match self {
            WaitError::Refresh(e) => WaitError::Refresh(f(e)),
            WaitError::Timeout {
                last_state,
                target,
                timeout,
            } => WaitError::Timeout {
                last_state,
                target,
                timeout,
            },
            WaitError::UnexpectedState { state, target } => {
                WaitError::UnexpectedState { state, target }
            }
            WaitError::NotFound { checks } => WaitError::NotFound { checks },
            WaitError::Cancelled => WaitError::Cancelled,
        }
    }
}

/// Configuration of one wait. Built per CRUD call and consumed by
/// `wait_for_state`.
pub struct StateChangeConf<F> {
    refresh: F,
    pending: Vec<String>,
    target: Vec<String>,
    delay: Duration,
    min_timeout: Duration,
    poll_interval: Option<Duration>,
    timeout: Duration,
    not_found_checks: usize,
}

impl<F> StateChangeConf<F> {
    pub fn new(refresh: F) -> Self {
        Self {
            refresh,
            pending: Vec::new(),
            target: Vec::new(),
            delay: Duration::ZERO,
            min_timeout: Duration::ZERO,
            poll_interval: None,
            timeout: DEFAULT_TIMEOUT,
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
        }
    }

    pub fn pending(mut self, states: &[&str]) -> Self {
        self.pending = states.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn target(mut self, states: &[&str]) -> Self {
        self.target = states.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Sleep after the first pending observation
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Lower bound for the sleep between later polls
    pub fn min_timeout(mut self, min_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self
    }

    /// Fixed sleep between later polls, never below `min_timeout`
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Consecutive "object missing" observations tolerated before failing
    pub fn not_found_checks(mut self, checks: usize) -> Self {
        self.not_found_checks = checks;
        self
    }

    fn next_wait(&self, first: bool) -> Duration {
        if first {
            return self.delay;
        }
        self.poll_interval
            .unwrap_or(self.min_timeout)
            .max(self.min_timeout)
    }

    /// Poll until a target status is observed.
    ///
    /// The effective timeout is the configured one, capped by the time the
    /// context has left. Cancelling the context ends the wait immediately.
    pub async fn wait_for_state<T, E, Fut>(mut self, ctx: &Context) -> Result<T, WaitError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RefreshResult<T, E>>,
    {
        let timeout = match ctx.remaining() {
            Some(remaining) if remaining < self.timeout => remaining,
            _ => self.timeout,
        };
        let target = self.target.join(", ");
        let mut last_state = String::new();

        let outcome = {
            let poll = tokio::time::timeout(timeout, self.poll(&mut last_state));
            tokio::select! {
                outcome = poll => outcome,
                _ = ctx.cancelled() => return Err(WaitError::Cancelled),
            }
        };

        match outcome {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(%last_state, %target, ?timeout, "wait timed out");
                Err(WaitError::Timeout {
                    last_state,
                    target,
                    timeout,
                })
            }
        }
    }

    async fn poll<T, E, Fut>(&mut self, last_state: &mut String) -> Result<T, WaitError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RefreshResult<T, E>>,
    {
        let mut first = true;
        let mut not_found = 0usize;

        loop {
            let (object, state) = (self.refresh)().await.map_err(WaitError::Refresh)?;
            tracing::debug!(state = %state, "refreshed resource state");
            *last_state = state.clone();

            match object {
                None => {
                    not_found += 1;
                    if not_found > self.not_found_checks {
                        return Err(WaitError::NotFound {
                            checks: self.not_found_checks,
                        });
                    }
                }
                Some(object) => {
                    not_found = 0;
                    if self.target.iter().any(|t| *t == state) {
                        return Ok(object);
                    }
                    if !self.pending.iter().any(|p| *p == state) {
                        return Err(WaitError::UnexpectedState {
                            state,
                            target: self.target.join(", "),
                        });
                    }
                }
            }

            let wait = self.next_wait(first);
            first = false;
            tokio::time::sleep(wait).await;
        }
    }
}
