use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    CASE_ID_MAX, CASE_ID_MIN, COMPETITION_DEFAULT_MINUTES, COMPETITION_MAX_SECS,
    COMPETITION_MIN_SECS, MAX_POOL_SIZE,
};

/// Pool mode as the server names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolMode {
    #[default]
    Off,
    Custom,
    Competition,
}

impl PoolMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Custom => "custom",
            Self::Competition => "competition",
        }
    }

    /// Level names double as pool selectors in the level picker.
    #[must_use]
    pub fn from_level(level: &str) -> Self {
        match level {
            "custom" => Self::Custom,
            "competition" => Self::Competition,
            _ => Self::Off,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("Enter 1–25 valid Case IDs (1–1820).")]
    Empty,
    #[error("Select custom or competition first.")]
    ModeOff,
    #[error("Please enter a valid Case ID (1–1820).")]
    CaseOutOfRange { value: i64 },
}

/// Validate a single case id typed by the player.
///
/// # Errors
///
/// Returns [`PoolError::CaseOutOfRange`] when the id is outside `1..=1820`.
pub fn validate_case_id(value: i64) -> Result<u32, PoolError> {
    u32::try_from(value)
        .ok()
        .filter(|id| (CASE_ID_MIN..=CASE_ID_MAX).contains(id))
        .ok_or(PoolError::CaseOutOfRange { value })
}

/// Parse a free-form case list: split on whitespace, commas and pipes, keep
/// in-range integers in first-seen order, drop duplicates, cap the length.
#[must_use]
pub fn parse_case_pool(text: &str) -> Vec<u32> {
    let mut ids: Vec<u32> = Vec::new();
    for token in text.split(|c: char| c.is_whitespace() || c == ',' || c == '|') {
        let Ok(value) = token.trim().parse::<i64>() else {
            continue;
        };
        let Ok(id) = validate_case_id(value) else {
            continue;
        };
        if !ids.contains(&id) {
            ids.push(id);
        }
        if ids.len() == MAX_POOL_SIZE {
            break;
        }
    }
    ids
}

/// Competition duration in seconds from a minutes field, clamped to range.
#[must_use]
pub fn competition_duration_secs(minutes: Option<u32>) -> u32 {
    let minutes = minutes
        .filter(|m| *m > 0)
        .unwrap_or(COMPETITION_DEFAULT_MINUTES);
    minutes
        .saturating_mul(60)
        .clamp(COMPETITION_MIN_SECS, COMPETITION_MAX_SECS)
}

/// Operator-curated puzzle set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfiguration {
    pub mode: PoolMode,
    pub case_ids: Vec<u32>,
    #[serde(default)]
    pub duration_sec: Option<u32>,
}

impl PoolConfiguration {
    #[must_use]
    pub fn off() -> Self {
        Self::default()
    }

    /// Build a pool from player input.
    ///
    /// # Errors
    ///
    /// Returns an error when `mode` is off or no valid case ids were given.
    pub fn from_input(mode: PoolMode, text: &str, minutes: Option<u32>) -> Result<Self, PoolError> {
        if mode == PoolMode::Off {
            return Err(PoolError::ModeOff);
        }
        let case_ids = parse_case_pool(text);
        if case_ids.is_empty() {
            return Err(PoolError::Empty);
        }
        let duration_sec =
            (mode == PoolMode::Competition).then(|| competition_duration_secs(minutes));
        Ok(Self {
            mode,
            case_ids,
            duration_sec,
        })
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.mode != PoolMode::Off
    }

    /// Text used to repopulate the pool field.
    #[must_use]
    pub fn to_input_text(&self) -> String {
        self.case_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
