use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_LEVEL, DEFAULT_TARGET, DEFAULT_THEME, POOL_COMPLETE_RESET_MS, TARGET_MAX, TARGET_MIN,
};
use crate::retry::RetryPolicy;

/// Difficulty and pool selectors offered by the level picker.
pub const LEVELS: [&str; 6] = ["easy", "medium", "hard", "challenge", "custom", "competition"];

/// Errors raised when session configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },
    #[error("unknown level '{level}'")]
    UnknownLevel { level: String },
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

/// Host-supplied session settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "SessionConfig::default_theme")]
    pub theme: String,
    #[serde(default = "SessionConfig::default_level")]
    pub level: String,
    #[serde(default = "SessionConfig::default_target")]
    pub target: i32,
    #[serde(default = "SessionConfig::default_auto_advance")]
    pub auto_advance: bool,
    /// Overrides the game's own auto-advance delay when set.
    #[serde(default)]
    pub advance_delay_ms: Option<u32>,
    #[serde(default = "SessionConfig::default_pool_reset_delay_ms")]
    pub pool_reset_delay_ms: u32,
    #[serde(default = "SessionConfig::default_exit_url")]
    pub exit_url: String,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl SessionConfig {
    fn default_theme() -> String {
        DEFAULT_THEME.to_string()
    }

    fn default_level() -> String {
        DEFAULT_LEVEL.to_string()
    }

    const fn default_target() -> i32 {
        DEFAULT_TARGET
    }

    const fn default_auto_advance() -> bool {
        true
    }

    const fn default_pool_reset_delay_ms() -> u32 {
        POOL_COMPLETE_RESET_MS
    }

    fn default_exit_url() -> String {
        "/".to_string()
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if the level is unknown, the target is out of range,
    /// or the theme is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.theme.trim().is_empty() {
            return Err(ConfigError::Empty { field: "theme" });
        }
        if !LEVELS.contains(&self.level.as_str()) {
            return Err(ConfigError::UnknownLevel {
                level: self.level.clone(),
            });
        }
        if !(TARGET_MIN..=TARGET_MAX).contains(&self.target) {
            return Err(ConfigError::RangeViolation {
                field: "target",
                min: i64::from(TARGET_MIN),
                max: i64::from(TARGET_MAX),
                value: i64::from(self.target),
            });
        }
        self.retry.validate()
    }

    /// Load and validate a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if the JSON cannot be parsed or fails validation.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: Self = serde_json::from_str(json).map_err(|err| err.to_string())?;
        config.validate().map_err(|err| err.to_string())?;
        Ok(config)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            theme: Self::default_theme(),
            level: Self::default_level(),
            target: Self::default_target(),
            auto_advance: Self::default_auto_advance(),
            advance_delay_ms: None,
            pool_reset_delay_ms: Self::default_pool_reset_delay_ms(),
            exit_url: Self::default_exit_url(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Clamp a requested target into the supported range.
#[must_use]
pub fn clamp_target(target: i64) -> i32 {
    crate::numbers::clamp_i64_to_i32(target.clamp(i64::from(TARGET_MIN), i64::from(TARGET_MAX)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(SessionConfig::default().validate(), Ok(()));
    }

    #[test]
    fn empty_json_uses_defaults() {
        let config = SessionConfig::from_json("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.target, 24);
        assert!(config.auto_advance);
    }

    #[test]
    fn unknown_level_is_rejected() {
        let err = SessionConfig::from_json(r#"{"level":"nightmare"}"#).unwrap_err();
        assert!(err.contains("nightmare"));
    }

    #[test]
    fn target_out_of_range_is_rejected() {
        let config = SessionConfig {
            target: 101,
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RangeViolation { field: "target", .. })
        ));
    }

    #[test]
    fn clamp_target_limits_range() {
        assert_eq!(clamp_target(500), 100);
        assert_eq!(clamp_target(-500), -100);
        assert_eq!(clamp_target(24), 24);
    }
}
