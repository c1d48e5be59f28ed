//! Session lifecycle control: unlock, lock, sign out, activity.
//!
//! The controller owns the single current-session slot, the shared reset
//! signal, and the countdown plumbing. Unlocking arms a fresh idle timer
//! (one countdown per unlock); any authenticated activity funnels through
//! [`SessionController::notify_activity`] to restart it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn};

use crate::config::GlobalConfig;
use crate::models::session::{SessionStatus, VaultSession};
use crate::signin::{self, AuthSnapshot, SigninRoute};
use crate::{AppError, Result};

use super::expiry;
use super::idle_timer::{IdleTimer, IdleTimerHandle};
use super::reset::ResetSignal;

/// Shared slot holding the current session, if any.
pub type SessionSlot = Arc<Mutex<Option<VaultSession>>>;

/// Shared cell holding the latest rendered countdown text.
pub type DisplayCell = Arc<Mutex<String>>;

/// Buffered timer events between the tick task and its consumer.
const TIMER_EVENT_BUFFER: usize = 32;

/// Live countdown plumbing for the current unlock.
struct TimerRig {
    handle: IdleTimerHandle,
    consumer: JoinHandle<()>,
    expired_gate: CancellationToken,
}

/// Application-side owner of the current vault session and its countdown.
pub struct SessionController {
    config: Arc<GlobalConfig>,
    session: SessionSlot,
    display: DisplayCell,
    reset: ResetSignal,
    timer: Mutex<Option<TimerRig>>,
}

impl SessionController {
    /// Create a controller with no session and an idle reset signal.
    #[must_use]
    pub fn new(config: Arc<GlobalConfig>) -> Self {
        Self {
            config,
            session: Arc::new(Mutex::new(None)),
            display: Arc::new(Mutex::new(String::new())),
            reset: ResetSignal::new(),
            timer: Mutex::new(None),
        }
    }

    /// Where the staged sign-in cascade stands for the given auth snapshot.
    #[must_use]
    pub fn signin_route(&self, auth: &AuthSnapshot) -> SigninRoute {
        signin::next_route(auth, &self.config.signin.backend_template)
    }

    /// Unlock the vault and begin a credential-viewing session.
    ///
    /// The staged sign-in must be complete and no session may currently be
    /// unlocked. When a nonzero idle timeout is configured, a fresh
    /// countdown is armed for the new session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Signin` if the sign-in cascade is not at
    /// `Ready`, or `AppError::Session` if a session is already unlocked.
    pub async fn unlock(&self, auth: &AuthSnapshot, account: &str) -> Result<VaultSession> {
        let span = info_span!("unlock", account);
        let _guard = span.enter();

        let route = self.signin_route(auth);
        if route != SigninRoute::Ready {
            warn!(?route, "unlock refused before sign-in is complete");
            return Err(AppError::Signin(format!(
                "sign-in incomplete: next step is {route:?}"
            )));
        }

        let session = VaultSession::new(account.to_owned());
        {
            let mut slot = self.session.lock().await;
            if slot
                .as_ref()
                .is_some_and(|s| s.status == SessionStatus::Unlocked)
            {
                return Err(AppError::Session("a session is already unlocked".into()));
            }
            *slot = Some(session.clone());
        }
        info!(session_id = %session.id, "vault unlocked");

        let timeout_secs = self.config.session.idle_timeout_seconds;
        if timeout_secs > 0 {
            self.arm_countdown(&session.id, timeout_secs).await;
        } else {
            info!(session_id = %session.id, "idle timeout disabled; no countdown armed");
        }

        Ok(session)
    }

    /// Close the vault at the user's request, keeping sign-in valid.
    ///
    /// Stops the countdown before touching the session so no expiry can
    /// race the transition.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if no session exists or the current
    /// session cannot be locked from its state.
    pub async fn lock(&self) -> Result<VaultSession> {
        let span = info_span!("lock");
        let _guard = span.enter();

        self.disarm_countdown().await;

        let mut slot = self.session.lock().await;
        let Some(current) = slot.as_mut() else {
            return Err(AppError::Session("no session to lock".into()));
        };
        if !current.can_transition_to(SessionStatus::Locked) {
            return Err(AppError::Session(format!(
                "cannot lock a session in state {:?}",
                current.status
            )));
        }
        current.status = SessionStatus::Locked;
        current.closed_at = Some(chrono::Utc::now());
        info!(session_id = %current.id, "vault locked");
        Ok(current.clone())
    }

    /// Tear down the current session entirely, countdown included.
    ///
    /// Safe from any state, including when no session exists. Returns the
    /// closed session record, if there was one.
    pub async fn sign_out(&self) -> Option<VaultSession> {
        let span = info_span!("sign_out");
        let _guard = span.enter();

        self.disarm_countdown().await;

        let mut slot = self.session.lock().await;
        let mut closed = slot.take();
        if let Some(ref mut session) = closed {
            if session.can_transition_to(SessionStatus::SignedOut) {
                session.status = SessionStatus::SignedOut;
            }
            if session.closed_at.is_none() {
                session.closed_at = Some(chrono::Utc::now());
            }
            info!(session_id = %session.id, "signed out");
        } else {
            info!("sign-out with no session");
        }
        closed
    }

    /// Record user or network activity.
    ///
    /// Refreshes the session's activity timestamp and requests a countdown
    /// restart on the timer's next tick. Every authenticated call a client
    /// makes should funnel through here.
    pub async fn notify_activity(&self) {
        self.reset.request();
        let mut slot = self.session.lock().await;
        if let Some(current) = slot.as_mut() {
            if current.status == SessionStatus::Unlocked {
                current.touch();
            }
        }
    }

    /// Clone of the shared reset signal for collaborators that report
    /// activity directly.
    #[must_use]
    pub fn reset_signal(&self) -> ResetSignal {
        self.reset.clone()
    }

    /// Latest rendered countdown text (empty before the first tick and
    /// after the countdown stops).
    pub async fn countdown_display(&self) -> String {
        self.display.lock().await.clone()
    }

    /// Snapshot of the current session, if any.
    pub async fn current_session(&self) -> Option<VaultSession> {
        self.session.lock().await.clone()
    }

    /// Resolve once an idle expiry has closed the current session.
    ///
    /// Pends forever while no countdown is armed (disabled timeout or no
    /// unlocked session).
    pub async fn wait_expired(&self) {
        let gate = {
            let rig = self.timer.lock().await;
            rig.as_ref().map(|r| r.expired_gate.clone())
        };
        match gate {
            Some(gate) => gate.cancelled().await,
            None => std::future::pending().await,
        }
    }

    /// Start the tick task and its event consumer for a fresh unlock.
    async fn arm_countdown(&self, session_id: &str, timeout_secs: u64) {
        let cancel = CancellationToken::new();
        let expired_gate = CancellationToken::new();
        let (event_tx, event_rx) = mpsc::channel(TIMER_EVENT_BUFFER);

        let handle = IdleTimer::new(
            session_id.to_owned(),
            Duration::from_secs(timeout_secs),
            self.config.session.countdown_format.clone(),
            self.reset.clone(),
            event_tx,
            cancel.clone(),
        )
        .spawn();

        let consumer = expiry::spawn_timer_event_consumer(
            event_rx,
            Arc::clone(&self.session),
            Arc::clone(&self.display),
            expired_gate.clone(),
            cancel,
        );

        let mut rig = self.timer.lock().await;
        if let Some(stale) = rig.take() {
            // Any previous rig is already defunct by the lifecycle rules;
            // stopping it again is a no-op.
            stale.handle.stop();
        }
        *rig = Some(TimerRig {
            handle,
            consumer,
            expired_gate,
        });

        info!(session_id, timeout_secs, "idle countdown armed");
    }

    /// Stop the countdown tasks and wait for them to exit.
    async fn disarm_countdown(&self) {
        let maybe_rig = {
            let mut rig = self.timer.lock().await;
            rig.take()
        };
        if let Some(rig) = maybe_rig {
            rig.handle.await_completion().await;
            let _ = rig.consumer.await;
        }
        self.display.lock().await.clear();
    }
}
