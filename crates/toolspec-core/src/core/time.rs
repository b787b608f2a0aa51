// toolspec-core/src/core/time.rs
// ============================================================================
// Module: ToolSpec Time Model
// Description: Canonical timestamp representation for install lifecycle events.
// Purpose: Provide deterministic, replayable time values across ToolSpec records.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! ToolSpec uses explicit time values embedded in install records and gating
//! decisions to keep evaluation deterministic. The core never reads wall-clock
//! time directly; hosts must supply timestamps at the protocol boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Timestamp parse or format error.
#[derive(Debug, Error)]
pub enum TimestampError {
    /// The input string is not valid RFC 3339.
    #[error("invalid rfc3339 timestamp: {0}")]
    Parse(String),
    /// The value cannot be represented as RFC 3339.
    #[error("unrepresentable timestamp: {0}")]
    Format(String),
}

/// Canonical timestamp used in ToolSpec records (unix epoch milliseconds).
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
/// - Monotonicity is a caller responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Parses an RFC 3339 string into a timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::Parse`] when the input is not valid RFC 3339.
    pub fn parse_rfc3339(input: &str) -> Result<Self, TimestampError> {
        let parsed = OffsetDateTime::parse(input, &Rfc3339)
            .map_err(|err| TimestampError::Parse(err.to_string()))?;
        let nanos = parsed.unix_timestamp_nanos();
        let millis = nanos / 1_000_000;
        i64::try_from(millis)
            .map(Self)
            .map_err(|_| TimestampError::Parse("timestamp out of range".to_string()))
    }

    /// Formats the timestamp as an RFC 3339 UTC string.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::Format`] when the value is out of the
    /// representable datetime range.
    pub fn to_rfc3339(self) -> Result<String, TimestampError> {
        let nanos = i128::from(self.0) * 1_000_000;
        let datetime = OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map_err(|err| TimestampError::Format(err.to_string()))?;
        datetime.format(&Rfc3339).map_err(|err| TimestampError::Format(err.to_string()))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::Timestamp;

    #[test]
    fn rfc3339_round_trip_preserves_millis() {
        let ts = Timestamp::from_unix_millis(1_764_547_200_123);
        let text = ts.to_rfc3339().unwrap();
        let parsed = Timestamp::parse_rfc3339(&text).unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Timestamp::parse_rfc3339("not-a-time").is_err());
    }
}
