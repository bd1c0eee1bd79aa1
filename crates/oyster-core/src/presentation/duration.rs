//! Elapsed-time computation and formatting.

use std::fmt;

use chrono::{DateTime, Utc};

/// Rendered in place of any value that is not set or not parseable.
pub const PLACEHOLDER: &str = "—";

const MS_PER_SECOND: i64 = 1_000;
const SECONDS_PER_DAY: i64 = 24 * 3_600;

/// Result of [`compute_elapsed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elapsed {
    /// No usable reference instant.
    Unset,
    /// Milliseconds since the reference instant, never negative.
    Since(i64),
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str(PLACEHOLDER),
            Self::Since(ms) => f.write_str(&format_duration(*ms)),
        }
    }
}

/// Parses a stored pulled-at string as an absolute instant.
///
/// Returns `None` for blank or non-RFC 3339 input.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Time elapsed between `pulled_at` and `now`.
///
/// A reference instant in the future (clock skew, typo) clamps to zero rather
/// than producing negative time.
pub fn compute_elapsed(pulled_at: Option<&str>, now: DateTime<Utc>) -> Elapsed {
    match pulled_at.and_then(parse_instant) {
        Some(t0) => Elapsed::Since((now - t0).num_milliseconds().max(0)),
        None => Elapsed::Unset,
    }
}

/// Formats a millisecond duration as `HH:MM:SS`, or `{days}d HH:MM:SS` once
/// it exceeds a day.  Negative input is treated as zero.
pub fn format_duration(duration_ms: i64) -> String {
    let total_seconds = duration_ms.max(0) / MS_PER_SECOND;
    let days = total_seconds / SECONDS_PER_DAY;
    let hours = (total_seconds % SECONDS_PER_DAY) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    if days > 0 {
        format!("{days}d {hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}
