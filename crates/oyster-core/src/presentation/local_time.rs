//! Conversions between absolute instants and local wall-clock text.
//!
//! The settings panel edits the pulled-at instant through a "local datetime"
//! field (`YYYY-MM-DDTHH:MM`, minute precision, no offset).  The document, on
//! the other hand, stores an absolute UTC instant.  These helpers convert
//! between the two in a caller-supplied time zone so tests can pin the zone
//! while the binary passes [`chrono::Local`].
//!
//! Round-trip law: for any well-formed `s`,
//! `to_local_field(&from_local_field(s, tz)?, tz) == s` (seconds truncated).

use std::fmt::Display;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use thiserror::Error;

use super::duration::{parse_instant, PLACEHOLDER};

/// Format of the local datetime field.
pub const LOCAL_FIELD_FORMAT: &str = "%Y-%m-%dT%H:%M";
const LOCAL_FIELD_FORMAT_WITH_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";
/// Human label format, e.g. `Mon, Jan 15, 9:30 AM`.
const LABEL_FORMAT: &str = "%a, %b %-d, %-I:%M %p";

/// Error type for local datetime field parsing.
#[derive(Debug, Error, PartialEq)]
pub enum TimeFieldError {
    #[error("no time entered")]
    Empty,

    #[error("'{text}' is not a local date and time (expected YYYY-MM-DDTHH:MM): {source}")]
    Unparsable {
        text: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The wall-clock time falls into a DST gap in the target zone.
    #[error("'{0}' does not exist in the local time zone")]
    NonexistentLocalTime(String),
}

/// Formats `instant` as `YYYY-MM-DDTHH:MM` in `tz`.
pub fn to_local_field<Tz>(instant: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    instant.with_timezone(tz).format(LOCAL_FIELD_FORMAT).to_string()
}

/// Parses local wall-clock `text` in `tz` and returns the absolute instant.
///
/// Accepts `YYYY-MM-DDTHH:MM` and `YYYY-MM-DDTHH:MM:SS`.  When the local time
/// is ambiguous (a DST fold) the earlier instant wins.
///
/// # Errors
///
/// - [`TimeFieldError::Empty`] for blank input.
/// - [`TimeFieldError::Unparsable`] when `text` is not in either format.
/// - [`TimeFieldError::NonexistentLocalTime`] when `text` falls into a DST gap.
pub fn from_local_field<Tz: TimeZone>(text: &str, tz: &Tz) -> Result<DateTime<Utc>, TimeFieldError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TimeFieldError::Empty);
    }

    let naive = NaiveDateTime::parse_from_str(text, LOCAL_FIELD_FORMAT_WITH_SECONDS)
        .or_else(|_| NaiveDateTime::parse_from_str(text, LOCAL_FIELD_FORMAT))
        .map_err(|source| TimeFieldError::Unparsable {
            text: text.to_string(),
            source,
        })?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| TimeFieldError::NonexistentLocalTime(text.to_string()))
}

/// Serialises an instant the way the document stores it
/// (`2024-01-15T09:30:00.000Z`).
pub fn to_iso_string(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Local date-time field for a stored pulled-at string, or `""` when the
/// string is absent or unparsable.
pub fn stored_to_local_field<Tz>(pulled_at: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pulled_at
        .and_then(parse_instant)
        .map(|instant| to_local_field(&instant, tz))
        .unwrap_or_default()
}

/// Human-readable local date and time, or [`PLACEHOLDER`].
pub fn format_pulled_at_label<Tz>(pulled_at: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match pulled_at.and_then(parse_instant) {
        Some(instant) => instant.with_timezone(tz).format(LABEL_FORMAT).to_string(),
        None => PLACEHOLDER.to_string(),
    }
}
