use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::errors::DomainError;

/// Deadline and cancellation signal carried through a single request.
///
/// Clones share the cancellation flag, so the transport layer can keep one
/// copy and cancel the work running on a blocking thread with another.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl RequestContext {
    /// A context with no deadline that is never cancelled unless asked to.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancelled: Arc::default(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline. `None` means unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fails if the request was cancelled or its deadline has passed.
    pub fn check(&self) -> Result<(), DomainError> {
        if self.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        if matches!(self.remaining(), Some(left) if left.is_zero()) {
            return Err(DomainError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Returns a guard that cancels this context when dropped, unless it was
    /// disarmed first.
    pub fn cancel_on_drop(&self) -> CancelGuard {
        CancelGuard {
            ctx: Some(self.clone()),
        }
    }
}

#[derive(Debug)]
pub struct CancelGuard {
    ctx: Option<RequestContext>,
}

impl CancelGuard {
    pub fn disarm(mut self) {
        self.ctx = None;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            ctx.cancel();
        }
    }
}
