//! Render model: everything a front end needs to draw the table, derived
//! from controller state in one pass.

use serde::{Deserialize, Serialize};

use crate::Clock;
use crate::envelope::CardImage;
use crate::rules::{GameKind, GameRules, HintPanel, QuestionContext};
use crate::session::{Phase, PlayMode, SessionController, StatusLine};
use crate::stats::StatsSnapshot;
use crate::summary::SessionSummary;
use crate::timer::{format_puzzle_time, format_total_time};

/// One position on the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardSlot {
    Face {
        rank: u32,
        image: Option<CardImage>,
    },
    /// Dealt but not yet revealed.
    Back,
}

impl CardSlot {
    /// Short rank label: A, 2..9, T, J, Q, K.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Face { rank, .. } => rank_label(*rank),
            Self::Back => "?".to_string(),
        }
    }
}

#[must_use]
pub fn rank_label(rank: u32) -> String {
    match rank {
        1 => "A".to_string(),
        10 => "T".to_string(),
        11 => "J".to_string(),
        12 => "Q".to_string(),
        13 => "K".to_string(),
        other => other.to_string(),
    }
}

/// Which buttons are live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Controls {
    pub can_deal: bool,
    pub can_submit: bool,
    pub can_hint: bool,
    pub can_skip: bool,
    pub can_restart: bool,
    pub can_exit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub game: GameKind,
    pub phase: Phase,
    pub mode: PlayMode,
    pub level: String,
    pub target: Option<i32>,
    pub question: Option<String>,
    pub cards: Vec<CardSlot>,
    pub formula: Option<String>,
    pub status: StatusLine,
    pub hint: Option<HintPanel>,
    pub stats: StatsSnapshot,
    pub stats_line: String,
    pub puzzle_time: String,
    pub total_time: String,
    pub countdown: Option<String>,
    pub pool_text: String,
    pub auto_advance: bool,
    pub advance_pending: bool,
    pub help_disabled: bool,
    pub controls: Controls,
    pub summary: Option<SessionSummary>,
}

impl SessionView {
    pub fn build<R: GameRules, C: Clock>(session: &SessionController<R, C>) -> Self {
        let state = session.state();
        let rules = session.rules();
        let caps = rules.capabilities();
        let now = session.clock().now_ms();
        let stats = *session.stats();

        let (question, cards, formula) = state.current_envelope.as_ref().map_or_else(
            || (None, Vec::new(), None),
            |envelope| {
                let pool_info = envelope.pool_info.as_ref();
                let question = rules.question_text(&QuestionContext {
                    display_sequence: state.display_sequence,
                    case_id: envelope.case_id,
                    values: &envelope.values,
                    target: caps.variable_target.then_some(state.target),
                    pool_position: pool_info.and_then(|info| info.position()),
                    last_puzzle: pool_info.is_some_and(|info| info.is_last_puzzle),
                });
                let reveal = session.reveal();
                let cards = envelope
                    .values
                    .iter()
                    .enumerate()
                    .map(|(idx, rank)| {
                        if reveal.is_visible(idx) {
                            CardSlot::Face {
                                rank: *rank,
                                image: envelope.images.get(idx).cloned(),
                            }
                        } else {
                            CardSlot::Back
                        }
                    })
                    .collect();
                let formula = caps
                    .reveal_stepping
                    .then(|| reveal.formula(&envelope.values));
                (Some(question), cards, formula)
            },
        );

        let busy = state.deal_in_flight || state.session_ended;
        let playing = state.phase == Phase::Playing;
        let help_disabled = session.help_disabled();
        let controls = Controls {
            can_deal: !busy,
            can_submit: playing && !state.session_ended,
            can_hint: !help_disabled
                && matches!(state.phase, Phase::Playing | Phase::Solved)
                && !state.session_ended,
            can_skip: !busy && state.current_envelope.is_some(),
            can_restart: true,
            can_exit: true,
        };

        Self {
            game: rules.kind(),
            phase: state.phase,
            mode: state.mode,
            level: state.level.clone(),
            target: caps.variable_target.then_some(state.target),
            question,
            cards,
            formula,
            status: session.status().clone(),
            hint: session.hint().cloned(),
            stats,
            stats_line: stats_line(&stats),
            puzzle_time: format_puzzle_time(session.puzzle_elapsed_ms()),
            total_time: format_total_time(stats.total_time_seconds),
            countdown: state
                .seconds_left(now)
                .map(|secs| format_total_time(u64::from(secs))),
            pool_text: session.pool().to_input_text(),
            auto_advance: state.auto_advance_enabled,
            advance_pending: session.is_advance_pending(),
            help_disabled,
            controls,
            summary: session.summary().cloned(),
        }
    }
}

/// One-line counter summary shown above the table.
#[must_use]
pub fn stats_line(stats: &StatsSnapshot) -> String {
    format!(
        "Played {} | Solved {} | Revealed {} | Skipped {} | Incorrect {} | Accuracy {}%",
        stats.played,
        stats.solved,
        stats.revealed,
        stats.skipped,
        stats.incorrect,
        stats.accuracy_percent()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_labels_use_face_letters() {
        assert_eq!(rank_label(1), "A");
        assert_eq!(rank_label(7), "7");
        assert_eq!(rank_label(13), "K");
        assert_eq!(CardSlot::Back.label(), "?");
    }

    #[test]
    fn stats_line_includes_accuracy() {
        let stats = StatsSnapshot {
            played: 4,
            solved: 3,
            ..StatsSnapshot::default()
        };
        assert_eq!(
            stats_line(&stats),
            "Played 4 | Solved 3 | Revealed 0 | Skipped 0 | Incorrect 0 | Accuracy 75%"
        );
    }
}
