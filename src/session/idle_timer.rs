//! Per-session idle countdown timer.
//!
//! Each unlocked session gets an [`IdleTimer`] that ticks once per second,
//! re-rendering the remaining time and firing [`TimerEvent::Expired`]
//! exactly once when the countdown reaches zero. A shared [`ResetSignal`]
//! lets any collaborator restart the countdown on the next tick
//! (idle-reset-on-activity).
//!
//! Events are delivered via a `tokio::sync::mpsc` channel so the session
//! controller can react (update the display, lock the vault).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use crate::models::countdown::Countdown;

use super::reset::ResetSignal;

/// Events emitted by the idle timer for session-controller handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Fresh display text for the current tick.
    Tick {
        /// Rendered countdown string, ready to show verbatim.
        display: String,
    },
    /// Countdown reached zero; the session must be torn down.
    Expired,
}

/// Builder for a per-session idle timer.
///
/// Call [`spawn`](Self::spawn) to start the background tick task.
pub struct IdleTimer {
    session_id: String,
    timeout: Duration,
    format: String,
    reset: ResetSignal,
    event_tx: mpsc::Sender<TimerEvent>,
    cancel: CancellationToken,
}

impl IdleTimer {
    /// Construct a new timer (does not start ticking yet).
    #[must_use]
    pub fn new(
        session_id: String,
        timeout: Duration,
        format: String,
        reset: ResetSignal,
        event_tx: mpsc::Sender<TimerEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session_id,
            timeout,
            format,
            reset,
            event_tx,
            cancel,
        }
    }

    /// Spawn the background tick task and return a handle for controlling it.
    #[must_use]
    pub fn spawn(self) -> IdleTimerHandle {
        let expired = Arc::new(AtomicBool::new(false));

        // Clone the cancellation token so the handle can cancel the task on drop.
        let cancel_for_handle = self.cancel.clone();

        let task_handle = tokio::spawn(
            Self::run(
                self.session_id.clone(),
                self.timeout,
                self.format,
                self.reset,
                self.event_tx,
                self.cancel,
                Arc::clone(&expired),
            )
            .instrument(info_span!("idle_timer")),
        );

        IdleTimerHandle {
            expired,
            session_id: self.session_id,
            join_handle: Some(task_handle),
            cancel: cancel_for_handle,
        }
    }

    /// Core tick loop.
    ///
    /// Tick order: drain a pending reset first, then the static-format
    /// escape hatch, then the expiry check, then the display render. The
    /// ordering makes a reset and an expiry landing on the same tick
    /// resolve in favor of the reset.
    async fn run(
        session_id: String,
        timeout: Duration,
        format: String,
        reset: ResetSignal,
        event_tx: mpsc::Sender<TimerEvent>,
        cancel: CancellationToken,
        expired: Arc<AtomicBool>,
    ) {
        let mut countdown = Countdown::begin(timeout, format);
        let mut interval = tokio::time::interval(Duration::from_secs(1));

        loop {
            // The first interval tick completes immediately, so tick 0
            // renders the full timeout right after spawn.
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!(session_id, "idle timer cancelled");
                    return;
                }
                _ = interval.tick() => {}
            }

            if reset.take() {
                countdown.restart();
                debug!(session_id, "countdown restarted on activity");
            }

            // A format with no time tokens renders once as a static label
            // and never expires.
            if !countdown.has_time_tokens() {
                info!(
                    session_id,
                    format = countdown.display_format(),
                    "format has no time tokens; emitting static display"
                );
                let _ = event_tx
                    .send(TimerEvent::Tick {
                        display: countdown.display_format().to_owned(),
                    })
                    .await;
                return;
            }

            let Some(remaining) = countdown.remaining(Instant::now()) else {
                expired.store(true, Ordering::SeqCst);
                let timeout_secs = countdown.timeout().as_secs();
                info!(session_id, timeout_secs, "idle countdown expired");
                let _ = event_tx.send(TimerEvent::Expired).await;
                return;
            };

            let _ = event_tx
                .send(TimerEvent::Tick {
                    display: countdown.render(remaining),
                })
                .await;
        }
    }
}

/// Handle returned from [`IdleTimer::spawn`] for controlling the timer.
pub struct IdleTimerHandle {
    expired: Arc<AtomicBool>,
    session_id: String,
    /// Task handle for the background tick loop.
    join_handle: Option<JoinHandle<()>>,
    /// Per-timer cancellation token, cancelled when the handle is dropped.
    cancel: CancellationToken,
}

impl Drop for IdleTimerHandle {
    /// Cancel the background tick task when the handle is dropped.
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl IdleTimerHandle {
    /// Stop ticking. Idempotent; safe after expiry or a previous stop.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether the countdown has fired its expiry.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    /// The session ID this handle controls.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Await the timer's completion.
    ///
    /// Signals the background task to stop via the cancellation token, then
    /// waits for it to exit. If no `JoinHandle` is stored, this is a no-op.
    pub async fn await_completion(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.await;
        }
    }
}
