//! Context implementation for request-scoped deadlines and cancellation
//!
//! Every resource callback receives a Context. Long running operations such as
//! the state-change waiter consult it to stop early when the host cancels the
//! request or its deadline passes.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Context carries a request deadline and a cancellation signal
/// CRITICAL: Pass this as first parameter to ALL async trait methods
#[derive(Clone)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Arc<watch::Sender<bool>>,
}

impl Context {
    pub fn new() -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            deadline: None,
            cancel: Arc::new(cancel),
        }
    }

    /// Derive a context whose deadline is at most `timeout` from now. The
    /// derived context shares cancellation with its parent.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            deadline: Some(match self.deadline {
                Some(existing) if existing < deadline => existing,
                _ => deadline,
            }),
            cancel: Arc::clone(&self.cancel),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; None when there is no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow() || self.remaining() == Some(Duration::ZERO)
    }

    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Resolves once `cancel` has been called on this context or any context
    /// sharing its cancellation. Deadlines are reported through `remaining`.
    pub async fn cancelled(&self) {
        let mut rx = self.cancel.subscribe();
        // The sender lives as long as self, so wait_for only ends on a match.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
