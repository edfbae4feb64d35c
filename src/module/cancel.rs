//! Cancellation and deadline signal for blocking module operations
//!
//! Filesystem work runs on blocking threads that cannot be interrupted from
//! the outside. Instead, every I/O step polls a [`Cancellation`] and aborts
//! with [`ModuleError::Cancelled`] or [`ModuleError::DeadlineExceeded`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::module::error::ModuleError;

#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A signal that never fires unless [`cancel`](Self::cancel) is called
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that fires once `timeout` has elapsed from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Returns an error if the signal has fired
    pub fn check(&self) -> Result<(), ModuleError> {
        if self.is_cancelled() {
            return Err(ModuleError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(ModuleError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Returns a guard that cancels this signal when dropped
    pub fn drop_guard(&self) -> CancelOnDrop {
        CancelOnDrop {
            cancellation: self.clone(),
        }
    }
}

/// Cancels the wrapped signal when dropped
#[derive(Debug)]
pub struct CancelOnDrop {
    cancellation: Cancellation,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}
