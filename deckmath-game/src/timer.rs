//! Per-puzzle stopwatch and session clock formatting.

use crate::numbers::millis_to_tenths;

/// Wall-clock stopwatch for the active puzzle.
///
/// Timestamps are supplied by the caller so the timer stays deterministic.
/// The only way elapsed time reaches the session total is
/// [`PuzzleTimer::accumulate`], which clears the start marker; a second call
/// for the same interval adds nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PuzzleTimer {
    started_at_ms: Option<u64>,
    frozen_ms: u64,
}

impl PuzzleTimer {
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.started_at_ms.is_some()
    }

    /// Start a fresh interval, settling any running one first. Returns the
    /// whole seconds settled from the previous interval.
    pub fn start(&mut self, now_ms: u64) -> u64 {
        let settled = self.accumulate(now_ms);
        self.started_at_ms = Some(now_ms);
        self.frozen_ms = 0;
        settled
    }

    /// Stop the running interval and return its whole seconds for the
    /// session total. Returns 0 when nothing is running.
    pub fn accumulate(&mut self, now_ms: u64) -> u64 {
        let Some(started) = self.started_at_ms.take() else {
            return 0;
        };
        let elapsed = now_ms.saturating_sub(started);
        self.frozen_ms = elapsed;
        elapsed / 1_000
    }

    /// Elapsed milliseconds of the current (or last stopped) interval.
    #[must_use]
    pub const fn elapsed_ms(&self, now_ms: u64) -> u64 {
        match self.started_at_ms {
            Some(started) => now_ms.saturating_sub(started),
            None => self.frozen_ms,
        }
    }

    /// Drop all timing without settling; used by session reset.
    pub const fn clear(&mut self) {
        self.started_at_ms = None;
        self.frozen_ms = 0;
    }
}

/// Format a running puzzle time as `MM:SS.t`.
#[must_use]
pub fn format_puzzle_time(ms: u64) -> String {
    let tenths = millis_to_tenths(ms);
    let total_secs = tenths / 10;
    format!(
        "{:02}:{:02}.{}",
        total_secs / 60,
        total_secs % 60,
        tenths % 10
    )
}

/// Format the session total as `MM:SS`.
#[must_use]
pub fn format_total_time(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
