//! Countdown value model: end instant, remaining-time decomposition,
//! and display-token substitution.
//!
//! A [`Countdown`] captures an immutable timeout and display format at
//! creation and derives an end instant from them. Restarting recomputes
//! the end instant from the present; rendering substitutes the recognized
//! tokens `{dd}`, `{hh}`, `{mm}`, and `{ss}` with two-digit zero-padded
//! field values.

use std::time::{Duration, Instant};

/// Recognized display tokens, in substitution order.
const TOKENS: [&str; 4] = ["{dd}", "{hh}", "{mm}", "{ss}"];

/// Whether a format string contains at least one recognized time token.
#[must_use]
pub fn has_time_tokens(format: &str) -> bool {
    TOKENS.iter().any(|token| format.contains(token))
}

/// Remaining time decomposed into display fields.
///
/// Days are unbounded; hours, minutes, and seconds are each taken modulo
/// their natural period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemainingTime {
    /// Whole days remaining.
    pub days: u64,
    /// Hours remaining within the current day (0..24).
    pub hours: u64,
    /// Minutes remaining within the current hour (0..60).
    pub minutes: u64,
    /// Seconds remaining within the current minute (0..60).
    pub seconds: u64,
}

impl RemainingTime {
    /// Decompose a whole-second count into display fields.
    #[must_use]
    pub fn from_secs(total: u64) -> Self {
        Self {
            days: total / 86_400,
            hours: (total / 3_600) % 24,
            minutes: (total / 60) % 60,
            seconds: total % 60,
        }
    }
}

/// The countdown core: an immutable timeout plus display format, and the
/// derived end instant.
#[derive(Debug, Clone)]
pub struct Countdown {
    timeout: Duration,
    format: String,
    end: Instant,
}

impl Countdown {
    /// Begin a countdown ending `timeout` from now.
    #[must_use]
    pub fn begin(timeout: Duration, format: String) -> Self {
        Self {
            timeout,
            format,
            end: Instant::now() + timeout,
        }
    }

    /// Restart the countdown: the end instant becomes now plus the
    /// original timeout.
    pub fn restart(&mut self) {
        self.end = Instant::now() + self.timeout;
    }

    /// Remaining time as seen at `now`, or `None` once the end instant
    /// has been reached.
    ///
    /// A partial trailing second counts as a full second, so the first
    /// observation of a fresh countdown reads the whole timeout even
    /// though the observation lands a few microseconds after creation.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Option<RemainingTime> {
        let left = self.end.saturating_duration_since(now);
        if left.is_zero() {
            return None;
        }
        let mut secs = left.as_secs();
        if left.subsec_nanos() > 0 {
            secs += 1;
        }
        Some(RemainingTime::from_secs(secs))
    }

    /// Render the display string for a remaining-time snapshot.
    ///
    /// Each recognized token is substituted at its first occurrence only;
    /// repeated or unrecognized tokens pass through verbatim.
    #[must_use]
    pub fn render(&self, remaining: RemainingTime) -> String {
        self.format
            .replacen("{dd}", &pad2(remaining.days), 1)
            .replacen("{hh}", &pad2(remaining.hours), 1)
            .replacen("{mm}", &pad2(remaining.minutes), 1)
            .replacen("{ss}", &pad2(remaining.seconds), 1)
    }

    /// Whether this countdown's format contains any recognized time token.
    #[must_use]
    pub fn has_time_tokens(&self) -> bool {
        has_time_tokens(&self.format)
    }

    /// The configured display format.
    #[must_use]
    pub fn display_format(&self) -> &str {
        &self.format
    }

    /// The configured timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The instant at which the countdown expires.
    #[must_use]
    pub fn end_instant(&self) -> Instant {
        self.end
    }
}

/// Zero-pad a field value to two digits.
///
/// The numeric string gains a leading zero only when it is a single
/// character; values of 100 or more are left as-is.
fn pad2(value: u64) -> String {
    let s = value.to_string();
    if s.len() == 1 {
        format!("0{s}")
    } else {
        s
    }
}
