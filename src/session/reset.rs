//! Shared reset signal for restarting the idle countdown.
//!
//! Any collaborator holding a clone can request a restart at any time;
//! the timer drains the request on its next tick via [`ResetSignal::take`].
//! Requests between two ticks coalesce into a single restart.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable one-shot restart request shared between the session
/// controller and the idle timer.
#[derive(Debug, Clone, Default)]
pub struct ResetSignal {
    requested: Arc<AtomicBool>,
}

impl ResetSignal {
    /// Create a signal with no pending request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a countdown restart on the timer's next tick.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Read and clear the pending request (the timer's per-tick drain).
    ///
    /// Returns `true` at most once per request, no matter how many
    /// collaborators raised the flag since the last drain.
    #[must_use]
    pub fn take(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }

    /// Whether a restart request is pending, without clearing it.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}
