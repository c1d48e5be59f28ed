//! Vault session model and lifecycle helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status for a credential-viewing session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Vault open; credentials readable; idle countdown armed.
    Unlocked,
    /// Vault closed at the user's request; sign-in remains valid.
    Locked,
    /// Vault closed by the idle countdown.
    Expired,
    /// Full sign-out; terminal.
    SignedOut,
}

/// Credential-viewing session entity.
///
/// A session exists per vault unlock. Re-unlocking after a lock or an
/// expiry always creates a new session; closed sessions are never reused.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct VaultSession {
    /// Unique session identifier.
    pub id: String,
    /// Account name the vault was opened for.
    pub account: String,
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last observed user or network activity.
    pub last_activity_at: DateTime<Utc>,
    /// When the session left `Unlocked`, if it has.
    pub closed_at: Option<DateTime<Utc>>,
}

impl VaultSession {
    /// Construct a freshly unlocked session with a generated identifier.
    #[must_use]
    pub fn new(account: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            account,
            status: SessionStatus::Unlocked,
            created_at: now,
            last_activity_at: now,
            closed_at: None,
        }
    }

    /// Determine whether a lifecycle transition is permitted.
    #[must_use]
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(
            (self.status, next),
            (
                SessionStatus::Unlocked,
                SessionStatus::Locked | SessionStatus::Expired | SessionStatus::SignedOut
            ) | (
                SessionStatus::Locked | SessionStatus::Expired,
                SessionStatus::SignedOut
            )
        )
    }

    /// Refresh `last_activity_at` to now.
    pub fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }

    /// Seconds elapsed since the last recorded activity.
    #[must_use]
    pub fn idle_seconds(&self) -> u64 {
        let elapsed = (Utc::now() - self.last_activity_at).num_seconds();
        u64::try_from(elapsed).unwrap_or(0)
    }
}
