//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert a counter to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Ratio of two counters, returning 0.0 when the denominator is zero.
#[must_use]
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    (u64_to_f64(numerator) / u64_to_f64(denominator)).clamp(0.0, 1.0)
}

/// Round a percentage in [0, 1] to whole percent for display.
#[must_use]
pub fn whole_percent(fraction: f64) -> u32 {
    if !fraction.is_finite() {
        return 0;
    }
    let scaled = (fraction.clamp(0.0, 1.0) * 100.0).round();
    cast::<f64, u32>(scaled).unwrap_or(0)
}

/// Clamp an i64 into the i32 range.
#[must_use]
pub fn clamp_i64_to_i32(value: i64) -> i32 {
    let clamped = value.clamp(i64::from(i32::MIN), i64::from(i32::MAX));
    i32::try_from(clamped).unwrap_or(0)
}

/// Convert a millisecond count into tenths of a second, rounding down.
#[must_use]
pub const fn millis_to_tenths(ms: u64) -> u64 {
    ms / 100
}
