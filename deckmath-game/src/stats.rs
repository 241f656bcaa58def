use serde::{Deserialize, Serialize};

use crate::numbers::{ratio, whole_percent};
use crate::protocol::ServerStats;

/// Session counters as displayed to the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub played: u64,
    pub solved: u64,
    pub revealed: u64,
    pub skipped: u64,
    pub incorrect: u64,
    pub total_time_seconds: u64,
    pub answer_attempts: u64,
    pub answer_correct: u64,
    pub deal_swaps: u64,
}

impl StatsSnapshot {
    /// Solved puzzles as a fraction of played ones.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.solved, self.played)
    }

    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        whole_percent(self.accuracy())
    }
}

/// Which local counter a resolution should bump when the server is silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalOutcome {
    Played,
    Solved,
    Incorrect,
    Revealed,
    Skipped,
}

/// Client copy of the session counters.
///
/// Server-supplied stats always win, field by field. Local increments are a
/// fallback for replies that carry no stats and are guarded by the caller's
/// per-hand flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsMirror {
    snapshot: StatsSnapshot,
}

impl StatsMirror {
    #[must_use]
    pub const fn snapshot(&self) -> &StatsSnapshot {
        &self.snapshot
    }

    /// Overwrite every field present in `stats`; absent fields keep their value.
    pub const fn apply_server(&mut self, stats: &ServerStats) {
        let snap = &mut self.snapshot;
        if let Some(v) = stats.played {
            snap.played = v;
        }
        if let Some(v) = stats.solved {
            snap.solved = v;
        }
        if let Some(v) = stats.revealed {
            snap.revealed = v;
        }
        if let Some(v) = stats.skipped {
            snap.skipped = v;
        }
        if let Some(v) = stats.total_time {
            snap.total_time_seconds = v;
        }
        if let Some(v) = stats.answer_attempts {
            snap.answer_attempts = v;
        }
        if let Some(v) = stats.answer_correct {
            snap.answer_correct = v;
        }
        if let Some(v) = stats.answer_wrong {
            snap.incorrect = v;
        }
        if let Some(v) = stats.deal_swaps {
            snap.deal_swaps = v;
        }
    }

    /// Apply server stats when present, otherwise run the local fallback.
    /// Returns true when the server supplied stats.
    pub fn reconcile(
        &mut self,
        server: Option<&ServerStats>,
        fallback: impl FnOnce(&mut Self),
    ) -> bool {
        if let Some(stats) = server {
            self.apply_server(stats);
            true
        } else {
            fallback(self);
            false
        }
    }

    pub const fn bump(&mut self, outcome: LocalOutcome) {
        let snap = &mut self.snapshot;
        match outcome {
            LocalOutcome::Played => snap.played = snap.played.saturating_add(1),
            LocalOutcome::Solved => {
                snap.solved = snap.solved.saturating_add(1);
                snap.answer_correct = snap.answer_correct.saturating_add(1);
            }
            LocalOutcome::Incorrect => snap.incorrect = snap.incorrect.saturating_add(1),
            LocalOutcome::Revealed => snap.revealed = snap.revealed.saturating_add(1),
            LocalOutcome::Skipped => snap.skipped = snap.skipped.saturating_add(1),
        }
    }

    pub const fn add_attempt(&mut self) {
        self.snapshot.answer_attempts = self.snapshot.answer_attempts.saturating_add(1);
    }

    /// Local time is tracked even when the server owns the other counters;
    /// the next server snapshot overwrites it.
    pub const fn add_seconds(&mut self, seconds: u64) {
        self.snapshot.total_time_seconds = self.snapshot.total_time_seconds.saturating_add(seconds);
    }

    /// Explicit session reset, the only path that lowers a counter.
    pub fn reset(&mut self) {
        self.snapshot = StatsSnapshot::default();
    }
}
