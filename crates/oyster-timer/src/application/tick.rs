//! TickUseCase: the once-a-second recompute of the live timer text.
//!
//! Each frame is computed from scratch from the document and the wall clock;
//! no state is carried between ticks, so there is nothing to correct when a
//! tick runs late.

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use oyster_core::presentation::local_time::format_pulled_at_label;
use oyster_core::{compute_elapsed, Elapsed, SettingsDocument, PLACEHOLDER};

/// Text shown by one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickFrame {
    /// `HH:MM:SS`, `{d}d HH:MM:SS`, or the placeholder.
    pub timer_text: String,
    /// `"{label}: {human date}"`, or `"{label}: —"`.
    pub pulled_at_text: String,
}

/// Computes the frame for `doc` at `now`.
pub fn tick_frame<Tz>(doc: &SettingsDocument, now: DateTime<Utc>, tz: &Tz) -> TickFrame
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let label = doc.text.resolved_label();
    match compute_elapsed(doc.pulled_at(), now) {
        Elapsed::Unset => TickFrame {
            timer_text: PLACEHOLDER.to_string(),
            pulled_at_text: format!("{label}: {PLACEHOLDER}"),
        },
        elapsed @ Elapsed::Since(_) => TickFrame {
            timer_text: elapsed.to_string(),
            pulled_at_text: format!("{label}: {}", format_pulled_at_label(doc.pulled_at(), tz)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 16, 10, 31, 30).unwrap()
    }

    #[test]
    fn test_frame_for_unset_document_shows_placeholders() {
        let frame = tick_frame(&SettingsDocument::default(), now(), &Utc);

        assert_eq!(frame.timer_text, "—");
        assert_eq!(frame.pulled_at_text, "Pulled at: —");
    }

    #[test]
    fn test_frame_for_invalid_timestamp_shows_placeholders() {
        let mut doc = SettingsDocument::default();
        doc.pulled_at = Some("last tuesday".to_string());

        let frame = tick_frame(&doc, now(), &Utc);

        assert_eq!(frame.timer_text, "—");
        assert_eq!(frame.pulled_at_text, "Pulled at: —");
    }

    #[test]
    fn test_frame_shows_elapsed_and_label() {
        // Arrange
        let mut doc = SettingsDocument::default();
        doc.pulled_at = Some("2024-01-15T09:30:00.000Z".to_string());

        // Act
        let frame = tick_frame(&doc, now(), &Utc);

        // Assert
        assert_eq!(frame.timer_text, "1d 01:01:30");
        assert_eq!(frame.pulled_at_text, "Pulled at: Mon, Jan 15, 9:30 AM");
    }

    #[test]
    fn test_frame_uses_custom_label() {
        let mut doc = SettingsDocument::default();
        doc.pulled_at = Some("2024-01-16T10:31:00.000Z".to_string());
        doc.text.label = "Shucked".to_string();

        let frame = tick_frame(&doc, now(), &Utc);

        assert_eq!(frame.timer_text, "00:00:30");
        assert!(frame.pulled_at_text.starts_with("Shucked: "));
    }

    #[test]
    fn test_consecutive_ticks_are_independent() {
        let mut doc = SettingsDocument::default();
        doc.pulled_at = Some("2024-01-16T10:31:00.000Z".to_string());

        let later = tick_frame(&doc, now() + chrono::Duration::seconds(5), &Utc);
        let earlier = tick_frame(&doc, now(), &Utc);

        assert_eq!(later.timer_text, "00:00:35");
        assert_eq!(earlier.timer_text, "00:00:30");
    }
}
