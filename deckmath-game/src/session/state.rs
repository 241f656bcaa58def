use serde::{Deserialize, Serialize};

use crate::envelope::PuzzleEnvelope;
use crate::pool::PoolMode;

/// How puzzles are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayMode {
    /// Server picks by level.
    #[default]
    Single,
    /// Untimed operator-curated pool.
    CustomPool,
    /// Timed pool with help disabled.
    Competition,
}

impl PlayMode {
    #[must_use]
    pub const fn is_pool(self) -> bool {
        !matches!(self, Self::Single)
    }

    #[must_use]
    pub const fn pool_mode(self) -> PoolMode {
        match self {
            Self::Single => PoolMode::Off,
            Self::CustomPool => PoolMode::Custom,
            Self::Competition => PoolMode::Competition,
        }
    }

    #[must_use]
    pub const fn from_pool_mode(mode: PoolMode) -> Self {
        match mode {
            PoolMode::Off => Self::Single,
            PoolMode::Custom => Self::CustomPool,
            PoolMode::Competition => Self::Competition,
        }
    }
}

/// Coarse lifecycle of the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No puzzle on the table; waiting for a deal.
    #[default]
    Idle,
    Dealing,
    Playing,
    /// Running-sum plan complete, waiting on `/finish`.
    Finishing,
    Solved,
    PoolComplete,
    /// Terminal until restart.
    Ended,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusTone {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// The single status message shown under the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLine {
    pub tone: StatusTone,
    pub text: String,
}

impl StatusLine {
    pub fn info(text: impl Into<String>) -> Self {
        Self::with_tone(StatusTone::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::with_tone(StatusTone::Success, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::with_tone(StatusTone::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::with_tone(StatusTone::Error, text)
    }

    fn with_tone(tone: StatusTone, text: impl Into<String>) -> Self {
        Self {
            tone,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Mutable table state owned by one controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub current_envelope: Option<PuzzleEnvelope>,
    /// What the banner shows as `Q<N>`; 0 before the first counted deal.
    pub display_sequence: u64,
    /// Handed to the server on the next advancing deal.
    pub next_request_sequence: u64,
    pub mode: PlayMode,
    pub level: String,
    pub theme: String,
    pub target: i32,
    pub auto_advance_enabled: bool,
    pub reveal_step: usize,
    pub counted_played_this_hand: bool,
    pub revealed_this_hand: bool,
    pub solved_this_hand: bool,
    pub session_ended: bool,
    pub phase: Phase,
    pub deal_in_flight: bool,
    pub help_disabled: bool,
    /// Competition seconds remaining as of `time_left_at_ms`.
    pub time_left_secs: Option<u32>,
    pub time_left_at_ms: u64,
}

impl SessionState {
    #[must_use]
    pub fn new(level: impl Into<String>, theme: impl Into<String>, target: i32, auto_advance: bool) -> Self {
        Self {
            current_envelope: None,
            display_sequence: 0,
            next_request_sequence: 1,
            mode: PlayMode::Single,
            level: level.into(),
            theme: theme.into(),
            target,
            auto_advance_enabled: auto_advance,
            reveal_step: 0,
            counted_played_this_hand: false,
            revealed_this_hand: false,
            solved_this_hand: false,
            session_ended: false,
            phase: Phase::Idle,
            deal_in_flight: false,
            help_disabled: false,
            time_left_secs: None,
            time_left_at_ms: 0,
        }
    }

    /// Forget everything about the current hand.
    pub(crate) fn clear_hand(&mut self) {
        self.current_envelope = None;
        self.reveal_step = 0;
        self.counted_played_this_hand = false;
        self.revealed_this_hand = false;
        self.solved_this_hand = false;
    }

    /// Mark the hand as played. Returns true only the first time per hand.
    pub(crate) const fn note_played(&mut self) -> bool {
        let first = !self.counted_played_this_hand;
        self.counted_played_this_hand = true;
        first
    }

    /// Mark the hand as revealed. Returns true only the first time per hand.
    pub(crate) const fn note_revealed(&mut self) -> bool {
        let first = !self.revealed_this_hand;
        self.revealed_this_hand = true;
        first
    }

    /// Undo [`Self::note_played`] when the request that claimed it failed.
    pub(crate) const fn release_played(&mut self) {
        self.counted_played_this_hand = false;
    }

    pub(crate) const fn release_revealed(&mut self) {
        self.revealed_this_hand = false;
    }

    /// Competition seconds remaining at `now_ms`.
    #[must_use]
    pub fn seconds_left(&self, now_ms: u64) -> Option<u32> {
        let base = self.time_left_secs?;
        let elapsed = now_ms.saturating_sub(self.time_left_at_ms) / 1_000;
        Some(base.saturating_sub(u32::try_from(elapsed).unwrap_or(u32::MAX)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_flags_fire_once() {
        let mut state = SessionState::new("easy", "classic", 24, true);
        assert!(state.note_played());
        assert!(!state.note_played());
        assert!(state.note_revealed());
        assert!(!state.note_revealed());
        state.clear_hand();
        assert!(state.note_played());
    }

    #[test]
    fn released_flags_can_be_claimed_again() {
        let mut state = SessionState::new("easy", "classic", 24, true);
        assert!(state.note_played());
        assert!(state.note_revealed());
        state.release_played();
        state.release_revealed();
        assert!(state.note_played());
        assert!(state.note_revealed());
    }

    #[test]
    fn countdown_counts_whole_seconds() {
        let mut state = SessionState::new("competition", "classic", 24, true);
        assert_eq!(state.seconds_left(5_000), None);
        state.time_left_secs = Some(10);
        state.time_left_at_ms = 1_000;
        assert_eq!(state.seconds_left(3_500), Some(8));
        assert_eq!(state.seconds_left(60_000), Some(0));
    }

    #[test]
    fn modes_map_to_pool_modes() {
        for mode in [PlayMode::Single, PlayMode::CustomPool, PlayMode::Competition] {
            assert_eq!(PlayMode::from_pool_mode(mode.pool_mode()), mode);
        }
        assert!(!PlayMode::Single.is_pool());
    }
}
