//! Per-variant game rules plugged into the shared session controller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{AUTO_ADVANCE_DELAY_MS, REVEAL_ADVANCE_DELAY_MS};
use crate::normalize::{normalize_expression, parse_integer_answer};
use crate::protocol::{CheckReply, HelpReply};

/// Which puzzle family a page plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Game24,
    RunningSum,
    CountByTwos,
}

impl GameKind {
    pub const ALL: [Self; 3] = [Self::Game24, Self::RunningSum, Self::CountByTwos];

    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Game24 => "game24",
            Self::RunningSum => "sum4",
            Self::CountByTwos => "count_by_2s",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Game24 => "Game 24",
            Self::RunningSum => "Running Sum",
            Self::CountByTwos => "Count by 2s",
        }
    }

    /// Default API mount point for the variant's backend.
    #[must_use]
    pub const fn api_base(self) -> &'static str {
        match self {
            Self::Game24 => "/game24/api",
            Self::RunningSum => "/sum4/api",
            Self::CountByTwos => "/count_by_2s/api",
        }
    }

    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }
}

/// Feature switches that shape the shared controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Cards flip in groups as correct partial answers arrive.
    pub reveal_stepping: bool,
    /// The player can choose the target value.
    pub variable_target: bool,
    /// Custom and competition pools are offered.
    pub pool_modes: bool,
}

/// Why an answer was refused before reaching the server.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnswerRejection {
    #[error("{0}")]
    Empty(&'static str),
    #[error("{0}")]
    Malformed(&'static str),
}

/// Hint panel contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintPanel {
    pub headline: String,
    pub lines: Vec<String>,
}

/// What the question banner needs to know about the current hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionContext<'a> {
    pub display_sequence: u64,
    pub case_id: Option<u32>,
    pub values: &'a [u32],
    pub target: Option<i32>,
    pub pool_position: Option<(u32, u32)>,
    pub last_puzzle: bool,
}

impl QuestionContext<'_> {
    fn prefix(&self) -> String {
        let mut text = if self.display_sequence == 0 {
            "Q-".to_string()
        } else {
            format!("Q{}", self.display_sequence)
        };
        if let Some(case_id) = self.case_id {
            text.push_str(&format!(" [#{case_id}]"));
        }
        text
    }

    fn suffix(&self) -> String {
        let mut text = String::new();
        if let Some((position, total)) = self.pool_position {
            text.push_str(&format!(" (Puzzle {position}/{total})"));
        }
        if self.last_puzzle {
            text.push_str(" | LAST PUZZLE");
        }
        text
    }
}

/// Variant-specific behaviour the session controller delegates to.
pub trait GameRules {
    fn kind(&self) -> GameKind;

    fn capabilities(&self) -> Capabilities;

    /// Turn raw input into the wire answer.
    ///
    /// # Errors
    ///
    /// Returns a rejection when the input is blank or cannot be an answer.
    fn prepare_answer(&self, raw: &str) -> Result<String, AnswerRejection>;

    fn question_text(&self, question: &QuestionContext<'_>) -> String;

    fn success_message(&self, reply: &CheckReply, target: i32) -> String;

    fn failure_message(&self, reply: &CheckReply) -> String {
        format!("✗ {}", reply.reason.as_deref().unwrap_or("Try again!"))
    }

    fn hint_panel(&self, reply: &HelpReply, all: bool, target: i32) -> HintPanel;

    fn advance_delay_ms(&self) -> u32 {
        AUTO_ADVANCE_DELAY_MS
    }
}

const EMPTY_ANSWER: &str = "Please enter a value.";

fn integer_answer(raw: &str) -> Result<String, AnswerRejection> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AnswerRejection::Empty(EMPTY_ANSWER));
    }
    parse_integer_answer(trimmed)
        .map(|value| value.to_string())
        .ok_or(AnswerRejection::Malformed("Enter a whole number."))
}

/// Four cards, any arithmetic, hit the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Game24Rules;

impl GameRules for Game24Rules {
    fn kind(&self) -> GameKind {
        GameKind::Game24
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            reveal_stepping: false,
            variable_target: true,
            pool_modes: true,
        }
    }

    fn prepare_answer(&self, raw: &str) -> Result<String, AnswerRejection> {
        let normalized = normalize_expression(raw);
        if normalized.is_empty() {
            return Err(AnswerRejection::Empty(EMPTY_ANSWER));
        }
        let lowered = normalized.to_ascii_lowercase();
        if lowered == "no solution" || lowered == "none" {
            return Ok("no solution".to_string());
        }
        Ok(normalized)
    }

    fn question_text(&self, question: &QuestionContext<'_>) -> String {
        let cards = question
            .values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let target = question
            .target
            .map_or_else(String::new, |t| format!(" | Target: {t}"));
        format!("{} Cards: {cards}{target}{}", question.prefix(), question.suffix())
    }

    fn success_message(&self, reply: &CheckReply, target: i32) -> String {
        if reply.is_no_solution() {
            "✓ Correct: no solution".to_string()
        } else {
            format!("✓ {}! Correct!", reply.value.unwrap_or_else(|| i64::from(target)))
        }
    }

    fn hint_panel(&self, reply: &HelpReply, all: bool, target: i32) -> HintPanel {
        let target = reply.target.unwrap_or(target);
        if reply.has_solution == Some(false) || reply.solutions.is_empty() {
            return HintPanel {
                headline: format!("No solution for target {target}."),
                lines: Vec::new(),
            };
        }
        let lines: Vec<String> = if all {
            reply.solutions.clone()
        } else {
            reply.solutions.iter().take(1).cloned().collect()
        };
        HintPanel {
            headline: if all {
                format!("All solutions ({}):", reply.solutions.len())
            } else {
                "Try this:".to_string()
            },
            lines,
        }
    }
}

/// Cards flip in groups; the player types the running total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningSumRules;

impl GameRules for RunningSumRules {
    fn kind(&self) -> GameKind {
        GameKind::RunningSum
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            reveal_stepping: true,
            variable_target: false,
            pool_modes: true,
        }
    }

    fn prepare_answer(&self, raw: &str) -> Result<String, AnswerRejection> {
        if raw.trim().is_empty() {
            return Err(AnswerRejection::Empty("Enter your running sum."));
        }
        integer_answer(raw)
    }

    fn question_text(&self, question: &QuestionContext<'_>) -> String {
        format!(
            "{} Add the cards as they flip.{}",
            question.prefix(),
            question.suffix()
        )
    }

    fn success_message(&self, _reply: &CheckReply, _target: i32) -> String {
        "✓ Correct! Sum complete.".to_string()
    }

    fn failure_message(&self, reply: &CheckReply) -> String {
        match (reply.expected, reply.reason.as_deref()) {
            (Some(expected), _) => format!("❌ Expected {expected}."),
            (None, Some(reason)) => format!("❌ {reason}"),
            (None, None) => "❌ Incorrect.".to_string(),
        }
    }

    fn hint_panel(&self, reply: &HelpReply, _all: bool, _target: i32) -> HintPanel {
        let expected = reply
            .expected
            .or_else(|| reply.solutions.first().and_then(|s| parse_integer_answer(s)));
        match expected {
            Some(value) => HintPanel {
                headline: format!("Current sum is {value}. Enter it and Check."),
                lines: Vec::new(),
            },
            None => HintPanel {
                headline: "No hint available for this step.".to_string(),
                lines: Vec::new(),
            },
        }
    }

    fn advance_delay_ms(&self) -> u32 {
        REVEAL_ADVANCE_DELAY_MS
    }
}

/// Count the cards by twos and type the final number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountByTwosRules;

impl GameRules for CountByTwosRules {
    fn kind(&self) -> GameKind {
        GameKind::CountByTwos
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            reveal_stepping: false,
            variable_target: false,
            pool_modes: true,
        }
    }

    fn prepare_answer(&self, raw: &str) -> Result<String, AnswerRejection> {
        integer_answer(raw)
    }

    fn question_text(&self, question: &QuestionContext<'_>) -> String {
        format!(
            "{} Count by 2s: how far do {} cards take you?{}",
            question.prefix(),
            question.values.len(),
            question.suffix()
        )
    }

    fn success_message(&self, reply: &CheckReply, _target: i32) -> String {
        reply
            .value
            .map_or_else(|| "✓ Correct!".to_string(), |v| format!("✓ {v}! Correct!"))
    }

    fn hint_panel(&self, reply: &HelpReply, _all: bool, _target: i32) -> HintPanel {
        let answer = reply
            .expected
            .map(|v| v.to_string())
            .or_else(|| reply.solutions.first().cloned());
        HintPanel {
            headline: answer.map_or_else(
                || "No hint available.".to_string(),
                |a| format!("The answer is {a}."),
            ),
            lines: Vec::new(),
        }
    }
}
