//! Cancellation and deadline tracking for traversals.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{DomainError, DomainResult};

/// Deadline and cancellation are polled once every this many steps.
const POLL_INTERVAL: u64 = 64;

/// Caller-controlled cancellation flag. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Cancels the wrapped token when dropped, so abandoning the future that
/// owns it stops the blocking traversal it started.
#[derive(Debug)]
pub(crate) struct CancelOnDrop(pub(crate) CancelToken);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Per-traversal budget.
#[derive(Debug)]
pub(crate) struct TraversalContext {
    deadline: Option<Instant>,
    timeout: Duration,
    internal: CancelToken,
    external: Option<CancelToken>,
    steps: u64,
}

impl TraversalContext {
    pub(crate) fn new(
        timeout: Duration,
        internal: CancelToken,
        external: Option<CancelToken>,
    ) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
            timeout,
            internal,
            external,
            steps: 0,
        }
    }

    /// A context that never times out or gets cancelled.
    #[cfg(test)]
    pub(crate) fn unbounded() -> Self {
        Self {
            deadline: None,
            timeout: Duration::MAX,
            internal: CancelToken::new(),
            external: None,
            steps: 0,
        }
    }

    /// Counts one unit of work and periodically checks the budget.
    pub(crate) fn tick(&mut self) -> DomainResult<()> {
        let poll = self.steps % POLL_INTERVAL == 0;
        self.steps += 1;
        if !poll {
            return Ok(());
        }
        let cancelled = self.internal.is_cancelled()
            || self.external.as_ref().is_some_and(CancelToken::is_cancelled);
        if cancelled {
            return Err(DomainError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(DomainError::Timeout {
                duration_ms: self.timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    pub(crate) fn steps(&self) -> u64 {
        self.steps
    }
}
