//! Centralized timing and range constants for Deckmath session logic.
//!
//! Every client variant shares these values so that deal pacing, pool limits
//! and retry behaviour stay consistent across game types. Adjusting them is a
//! reviewed code change rather than a runtime setting.

// Scheduling ----------------------------------------------------------------
/// Delay between a correct answer and the automatic next deal.
pub const AUTO_ADVANCE_DELAY_MS: u32 = 900;
/// Faster auto-advance used by progressive reveal games.
pub const REVEAL_ADVANCE_DELAY_MS: u32 = 400;
/// Delay before a finished pool drops back to single play.
pub const POOL_COMPLETE_RESET_MS: u32 = 2_000;

// Case identifiers ----------------------------------------------------------
pub const CASE_ID_MIN: u32 = 1;
pub const CASE_ID_MAX: u32 = 1_820;
pub const MAX_POOL_SIZE: usize = 25;

// Competition ---------------------------------------------------------------
pub const COMPETITION_MIN_SECS: u32 = 60;
pub const COMPETITION_MAX_SECS: u32 = 3_600;
pub const COMPETITION_DEFAULT_MINUTES: u32 = 5;

// Targets -------------------------------------------------------------------
pub const DEFAULT_TARGET: i32 = 24;
pub const TARGET_MIN: i32 = -100;
pub const TARGET_MAX: i32 = 100;

// Retry ---------------------------------------------------------------------
/// Extra attempts after the first failed idempotent read.
pub const READ_RETRY_ATTEMPTS: u32 = 1;
/// Linear backoff step; attempt `n` waits `n * step`.
pub const READ_RETRY_BACKOFF_MS: u32 = 250;

// Levels --------------------------------------------------------------------
pub const DEFAULT_LEVEL: &str = "easy";
pub const DEFAULT_THEME: &str = "classic";

// Identifier prefixes used when secure UUIDs are unavailable ------------------
pub(crate) const CLIENT_ID_FALLBACK_PREFIX: &str = "c_";
pub(crate) const GUEST_ID_FALLBACK_PREFIX: &str = "g_";
