//! Timer event consumer that applies [`TimerEvent`]s to the session state.
//!
//! Reads events from the shared `mpsc::Receiver<TimerEvent>` channel,
//! mirrors `Tick` displays into the shared display cell, and handles
//! `Expired` by transitioning the unlocked session to `Expired` exactly
//! once and releasing expiry waiters.

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::models::session::SessionStatus;

use super::controller::{DisplayCell, SessionSlot};
use super::idle_timer::TimerEvent;

/// Spawn a background task that reads timer events and applies them.
///
/// The task runs until the `CancellationToken` fires, the `mpsc` channel
/// closes, or an expiry has been applied. Returns a `JoinHandle` so the
/// caller can await clean shutdown.
///
/// # Arguments
///
/// * `rx`           — Receiving end of the timer event channel.
/// * `session`      — Slot holding the current session.
/// * `display`      — Cell holding the latest rendered countdown text.
/// * `expired_gate` — Token cancelled once expiry has been applied.
/// * `cancel`       — Cancellation token for graceful shutdown.
#[must_use]
pub fn spawn_timer_event_consumer(
    mut rx: mpsc::Receiver<TimerEvent>,
    session: SessionSlot,
    display: DisplayCell,
    expired_gate: CancellationToken,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                () = cancel.cancelled() => {
                    info!("timer event consumer shutting down");
                    break;
                }
                maybe_event = rx.recv() => {
                    if let Some(e) = maybe_event { e } else {
                        info!("timer event channel closed");
                        break;
                    }
                }
            };

            match event {
                TimerEvent::Tick { display: text } => {
                    let mut cell = display.lock().await;
                    *cell = text;
                }
                TimerEvent::Expired => {
                    apply_expiry(&session).await;
                    display.lock().await.clear();
                    expired_gate.cancel();
                    break;
                }
            }
        }
    })
}

/// Transition the current session to `Expired`, if it is still unlocked.
async fn apply_expiry(session: &SessionSlot) {
    let mut slot = session.lock().await;
    match slot.as_mut() {
        Some(current) if current.can_transition_to(SessionStatus::Expired) => {
            let idle_secs = current.idle_seconds();
            current.status = SessionStatus::Expired;
            current.closed_at = Some(Utc::now());
            info!(
                session_id = %current.id,
                idle_secs,
                "session expired after idle timeout"
            );
        }
        Some(current) => {
            warn!(
                session_id = %current.id,
                status = ?current.status,
                "expiry event for a session that is not unlocked"
            );
        }
        None => {
            warn!("expiry event with no current session");
        }
    }
}
