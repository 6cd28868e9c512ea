use serde::Serialize;
use spectrum_types::RoundTiming;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// Local generation counter for rounds. Requests carry the id of the round
/// that issued them so late answers can be recognized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RoundId(u64);

impl RoundId {
    pub fn first() -> Self {
        Self(0)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round-{}", self.0)
    }
}

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Countdown to the next round, extrapolated locally from one authoritative
/// `(next_round_at, round_duration_ms)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundClock {
    next_round_at: i64,
    round_duration_ms: i64,
}

impl RoundClock {
    pub fn new(timing: RoundTiming) -> Self {
        Self {
            next_round_at: timing.next_round_at,
            round_duration_ms: timing.round_duration_ms,
        }
    }

    pub fn next_round_at(&self) -> i64 {
        self.next_round_at
    }

    pub fn round_duration_ms(&self) -> i64 {
        self.round_duration_ms
    }

    pub fn remaining_ms(&self, now: i64) -> i64 {
        (self.next_round_at - now).max(0)
    }

    /// Move the boundary past `now` if it has been reached. Returns true when
    /// a new round began. Several missed boundaries collapse into one advance.
    /// A non-positive duration never advances.
    pub fn advance_if_due(&mut self, now: i64) -> bool {
        if self.round_duration_ms <= 0 || now < self.next_round_at {
            return false;
        }
        let behind = now - self.next_round_at;
        let periods = behind / self.round_duration_ms + 1;
        self.next_round_at += periods * self.round_duration_ms;
        true
    }
}

/// `"{h}h {m}m {s}s"`, or `"Now!"` once the countdown reaches zero.
pub fn format_remaining(remaining_ms: i64) -> String {
    if remaining_ms <= 0 {
        return "Now!".to_string();
    }
    let total_seconds = remaining_ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{}h {}m {}s", hours, minutes, seconds)
}
