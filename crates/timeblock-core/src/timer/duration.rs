//! Custom duration validation at the input boundary.
//!
//! Everything that reaches `TimerEngine::set_duration_minutes` has passed
//! through here first, so the engine itself never sees an out-of-range
//! session length.

use crate::error::ValidationError;
use crate::timer::engine::{MAX_CUSTOM_MINUTES, MIN_CUSTOM_MINUTES};

/// Check a numeric minute count against the 1..=120 range.
pub fn validate_minutes(minutes: i64) -> Result<u32, ValidationError> {
    if minutes < MIN_CUSTOM_MINUTES as i64 {
        return Err(ValidationError::DurationTooShort);
    }
    if minutes > MAX_CUSTOM_MINUTES as i64 {
        return Err(ValidationError::DurationTooLong);
    }
    Ok(minutes as u32)
}

/// Parse free-form user input into a minute count.
///
/// Blank input is reported as missing; anything non-numeric falls out of
/// the minimum check, same as a number below one minute.
pub fn parse_custom_minutes(input: &str) -> Result<u32, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingDuration);
    }
    let minutes: i64 = trimmed
        .parse()
        .map_err(|_| ValidationError::DurationTooShort)?;
    validate_minutes(minutes)
}
