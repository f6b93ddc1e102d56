use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::ProcessError;

/// Cancellation and deadline handle passed to every process operation.
///
/// Clones share the cancellation flag, so cancelling any clone cancels them
/// all. Backends check the context before touching the system; a read that is
/// already in flight runs to completion.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// A context that never expires and is never cancelled unless asked.
    pub fn background() -> Self {
        Self::default()
    }

    /// A timeout too large to represent as an `Instant` means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::background(),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Fail fast if the caller has given up on this work.
    pub fn check(&self) -> Result<(), ProcessError> {
        if self.is_cancelled() {
            return Err(ProcessError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ProcessError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
