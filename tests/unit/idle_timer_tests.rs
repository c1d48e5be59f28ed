//! Unit tests for the idle countdown timer task.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use vault_sentinel::session::idle_timer::{IdleTimer, TimerEvent};
use vault_sentinel::session::reset::ResetSignal;

/// Build an unspawned timer plus the collaborators a test needs to drive it.
fn test_timer(
    session_id: &str,
    timeout_secs: u64,
    format: &str,
) -> (
    IdleTimer,
    mpsc::Receiver<TimerEvent>,
    ResetSignal,
    CancellationToken,
) {
    let (event_tx, event_rx) = mpsc::channel(8);
    let reset = ResetSignal::new();
    let cancel = CancellationToken::new();
    let timer = IdleTimer::new(
        session_id.to_owned(),
        Duration::from_secs(timeout_secs),
        format.to_owned(),
        reset.clone(),
        event_tx,
        cancel.clone(),
    );
    (timer, event_rx, reset, cancel)
}

/// Receive the next event, bounded so a wedged timer fails the test.
async fn next_event(event_rx: &mut mpsc::Receiver<TimerEvent>) -> TimerEvent {
    tokio::time::timeout(Duration::from_secs(3), event_rx.recv())
        .await
        .expect("timer should emit an event within the bound")
        .expect("event channel should still be open")
}

/// Drain every remaining event until the timer task drops its sender.
async fn drain_events(event_rx: &mut mpsc::Receiver<TimerEvent>) -> Vec<TimerEvent> {
    let mut events = Vec::new();
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), event_rx.recv())
            .await
            .expect("timer should settle within the bound");
        match next {
            Some(event) => events.push(event),
            None => return events,
        }
    }
}

#[tokio::test]
async fn first_tick_renders_full_timeout() {
    let (timer, mut event_rx, _reset, _cancel) = test_timer("sess-first", 65, "{mm}:{ss}");
    let handle = timer.spawn();

    // The first tick completes immediately and shows the whole timeout.
    let event = next_event(&mut event_rx).await;
    assert_eq!(
        event,
        TimerEvent::Tick {
            display: "01:05".to_owned()
        }
    );

    handle.stop();
}

#[tokio::test]
async fn short_timeout_expires_with_final_event() {
    let (timer, mut event_rx, _reset, _cancel) = test_timer("sess-expire", 1, "{ss}");
    let handle = timer.spawn();

    let events = drain_events(&mut event_rx).await;
    assert_eq!(
        events.first(),
        Some(&TimerEvent::Tick {
            display: "01".to_owned()
        })
    );
    assert_eq!(events.last(), Some(&TimerEvent::Expired));
    assert_eq!(
        events
            .iter()
            .filter(|event| matches!(event, TimerEvent::Expired))
            .count(),
        1,
        "expiry fires exactly once"
    );
    assert!(handle.is_expired());
}

#[tokio::test]
async fn zero_timeout_expires_on_the_first_tick() {
    let (timer, mut event_rx, _reset, _cancel) = test_timer("sess-zero", 0, "{ss}");
    let handle = timer.spawn();

    let event = next_event(&mut event_rx).await;
    assert_eq!(event, TimerEvent::Expired);

    let rest = drain_events(&mut event_rx).await;
    assert!(rest.is_empty(), "nothing follows expiry");
    assert!(handle.is_expired());
}

#[tokio::test]
async fn activity_reset_restarts_the_countdown() {
    let (timer, mut event_rx, reset, _cancel) = test_timer("sess-reset", 3, "{ss}");
    let handle = timer.spawn();

    let first = next_event(&mut event_rx).await;
    assert_eq!(
        first,
        TimerEvent::Tick {
            display: "03".to_owned()
        }
    );

    let second = next_event(&mut event_rx).await;
    assert_eq!(
        second,
        TimerEvent::Tick {
            display: "02".to_owned()
        }
    );

    // Activity lands between ticks; the next tick starts over from the top.
    reset.request();
    let third = next_event(&mut event_rx).await;
    assert_eq!(
        third,
        TimerEvent::Tick {
            display: "03".to_owned()
        }
    );
    assert!(!handle.is_expired());

    handle.stop();
}

#[tokio::test]
async fn static_format_renders_once_and_never_expires() {
    let (timer, mut event_rx, _reset, _cancel) =
        test_timer("sess-static", 1, "vault locks automatically");
    let handle = timer.spawn();

    let event = next_event(&mut event_rx).await;
    assert_eq!(
        event,
        TimerEvent::Tick {
            display: "vault locks automatically".to_owned()
        }
    );

    // The task exits after the static render, so the channel closes
    // without ever carrying an expiry.
    let rest = drain_events(&mut event_rx).await;
    assert!(rest.is_empty());
    assert!(!handle.is_expired());
}

#[tokio::test]
async fn stop_prevents_expiry() {
    let (timer, mut event_rx, _reset, _cancel) = test_timer("sess-stop", 60, "{mm}:{ss}");
    let handle = timer.spawn();

    let _first = next_event(&mut event_rx).await;
    handle.stop();

    let rest = drain_events(&mut event_rx).await;
    assert!(
        !rest.contains(&TimerEvent::Expired),
        "a stopped timer never expires"
    );
    assert!(!handle.is_expired());
}

#[tokio::test]
async fn stop_is_idempotent() {
    let (timer, mut event_rx, _reset, _cancel) = test_timer("sess-restop", 60, "{mm}:{ss}");
    let handle = timer.spawn();

    handle.stop();
    handle.stop();

    let rest = drain_events(&mut event_rx).await;
    assert!(!rest.contains(&TimerEvent::Expired));
}

#[tokio::test]
async fn stop_after_expiry_is_harmless() {
    let (timer, mut event_rx, _reset, _cancel) = test_timer("sess-late-stop", 0, "{ss}");
    let handle = timer.spawn();

    let event = next_event(&mut event_rx).await;
    assert_eq!(event, TimerEvent::Expired);

    handle.stop();
    handle.stop();

    let rest = drain_events(&mut event_rx).await;
    assert!(rest.is_empty(), "no duplicate expiry after late stops");
    assert!(handle.is_expired());
}

#[tokio::test]
async fn external_cancellation_stops_the_timer() {
    let (timer, mut event_rx, _reset, cancel) = test_timer("sess-cancel", 60, "{mm}:{ss}");
    let handle = timer.spawn();

    let _first = next_event(&mut event_rx).await;
    cancel.cancel();

    let rest = drain_events(&mut event_rx).await;
    assert!(!rest.contains(&TimerEvent::Expired));
    assert!(!handle.is_expired());
}

#[tokio::test]
async fn dropping_the_handle_cancels_the_task() {
    let (timer, mut event_rx, _reset, _cancel) = test_timer("sess-drop", 60, "{mm}:{ss}");
    let handle = timer.spawn();

    let _first = next_event(&mut event_rx).await;
    drop(handle);

    let rest = drain_events(&mut event_rx).await;
    assert!(!rest.contains(&TimerEvent::Expired));
}

#[tokio::test]
async fn await_completion_resolves_after_cancelling() {
    let (timer, mut event_rx, _reset, _cancel) = test_timer("sess-await", 60, "{mm}:{ss}");
    let handle = timer.spawn();
    assert_eq!(handle.session_id(), "sess-await");

    tokio::time::timeout(Duration::from_secs(2), handle.await_completion())
        .await
        .expect("await_completion should resolve promptly");

    let rest = drain_events(&mut event_rx).await;
    assert!(!rest.contains(&TimerEvent::Expired));
}
