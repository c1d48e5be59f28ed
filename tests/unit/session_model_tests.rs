//! Unit tests for the vault session model.

use chrono::{Duration as ChronoDuration, Utc};

use vault_sentinel::models::session::{SessionStatus, VaultSession};

#[test]
fn new_session_starts_unlocked() {
    let session = VaultSession::new("primary".to_owned());

    assert_eq!(session.account, "primary");
    assert_eq!(session.status, SessionStatus::Unlocked);
    assert!(session.closed_at.is_none());
    assert!(!session.id.is_empty());
    assert_eq!(session.created_at, session.last_activity_at);
}

#[test]
fn session_ids_are_unique() {
    let first = VaultSession::new("primary".to_owned());
    let second = VaultSession::new("primary".to_owned());
    assert_ne!(first.id, second.id);
}

#[test]
fn unlocked_can_leave_in_every_direction() {
    let session = VaultSession::new("primary".to_owned());

    assert!(session.can_transition_to(SessionStatus::Locked));
    assert!(session.can_transition_to(SessionStatus::Expired));
    assert!(session.can_transition_to(SessionStatus::SignedOut));
    assert!(!session.can_transition_to(SessionStatus::Unlocked));
}

#[test]
fn locked_only_signs_out() {
    let mut session = VaultSession::new("primary".to_owned());
    session.status = SessionStatus::Locked;

    assert!(session.can_transition_to(SessionStatus::SignedOut));
    assert!(!session.can_transition_to(SessionStatus::Unlocked));
    assert!(!session.can_transition_to(SessionStatus::Expired));
    assert!(!session.can_transition_to(SessionStatus::Locked));
}

#[test]
fn expired_only_signs_out() {
    let mut session = VaultSession::new("primary".to_owned());
    session.status = SessionStatus::Expired;

    assert!(session.can_transition_to(SessionStatus::SignedOut));
    assert!(!session.can_transition_to(SessionStatus::Unlocked));
    assert!(!session.can_transition_to(SessionStatus::Locked));
}

#[test]
fn signed_out_is_terminal() {
    let mut session = VaultSession::new("primary".to_owned());
    session.status = SessionStatus::SignedOut;

    assert!(!session.can_transition_to(SessionStatus::Unlocked));
    assert!(!session.can_transition_to(SessionStatus::Locked));
    assert!(!session.can_transition_to(SessionStatus::Expired));
    assert!(!session.can_transition_to(SessionStatus::SignedOut));
}

#[test]
fn touch_advances_last_activity() {
    let mut session = VaultSession::new("primary".to_owned());
    session.last_activity_at = Utc::now() - ChronoDuration::seconds(90);

    session.touch();

    assert!(session.idle_seconds() < 5);
}

#[test]
fn idle_seconds_measures_since_last_activity() {
    let mut session = VaultSession::new("primary".to_owned());
    session.last_activity_at = Utc::now() - ChronoDuration::seconds(120);

    let idle = session.idle_seconds();
    assert!((120..=125).contains(&idle), "idle was {idle}");
}

#[test]
fn idle_seconds_clamps_future_activity_to_zero() {
    let mut session = VaultSession::new("primary".to_owned());
    session.last_activity_at = Utc::now() + ChronoDuration::seconds(30);

    assert_eq!(session.idle_seconds(), 0);
}

#[test]
fn status_serializes_snake_case() {
    let json = serde_json::to_string(&SessionStatus::SignedOut).expect("serialize status");
    assert_eq!(json, "\"signed_out\"");

    let parsed: SessionStatus = serde_json::from_str("\"unlocked\"").expect("parse status");
    assert_eq!(parsed, SessionStatus::Unlocked);
}

#[test]
fn unknown_status_fails_deserialization() {
    let result: Result<SessionStatus, _> = serde_json::from_str("\"suspended\"");
    assert!(result.is_err(), "unknown status should fail to deserialize");
}

#[test]
fn session_round_trips_through_json() {
    let mut session = VaultSession::new("primary".to_owned());
    session.status = SessionStatus::Expired;
    session.closed_at = Some(Utc::now());

    let json = serde_json::to_string(&session).expect("serialize session");
    let parsed: VaultSession = serde_json::from_str(&json).expect("parse session");
    assert_eq!(parsed, session);
}
