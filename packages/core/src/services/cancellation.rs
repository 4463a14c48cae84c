//! Cooperative cancellation for traversal calls
//!
//! A [`CancellationSignal`] is cloned into whatever task might want to stop a
//! traversal. The engine only looks at it between depth levels, so an
//! in-flight batched read always completes before the call returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Why a signal has tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalState {
    Cancelled,
    DeadlineExceeded,
}

/// Cancel flag plus an optional deadline.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationSignal {
    /// A signal that never trips unless `cancel` is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that trips at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    /// A signal that trips `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Raise the cancel flag. Every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Same flag, with `fallback` applied as deadline if none is set.
    pub fn or_timeout(&self, fallback: Duration) -> Self {
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline: Some(self.deadline.unwrap_or_else(|| Instant::now() + fallback)),
        }
    }

    /// Current state, `None` while the traversal may continue.
    ///
    /// An explicit cancel wins over an expired deadline.
    pub fn check(&self) -> Option<SignalState> {
        if self.is_cancelled() {
            return Some(SignalState::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(SignalState::DeadlineExceeded),
            _ => None,
        }
    }
}
