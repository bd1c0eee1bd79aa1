//! Transient, auto-dismissing status messages.
//!
//! Every user action that is acknowledged with a short status line
//! ("Saved.", "Photo removed.", ...) produces a [`Status`].  A [`StatusLine`]
//! shows the latest one until its time-to-live runs out.  A newer message
//! replaces the old one and restarts the clock; expiry only ever clears the
//! message it was started for.

use std::fmt;
use std::time::{Duration, Instant};

/// How long a status message stays visible by default.
pub const DEFAULT_STATUS_TTL: Duration = Duration::from_millis(2_500);

/// User-facing acknowledgements and soft errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    SetToNow,
    Saved,
    PickTimeFirst,
    Cleared,
    PhotoSaved,
    PhotoFailed,
    PhotoRemoved,
    SettingsReset,
    /// Persisting the document failed; the change is kept in memory only.
    SaveFailed,
}

impl Status {
    pub fn message(self) -> &'static str {
        match self {
            Self::SetToNow => "Set to now.",
            Self::Saved => "Saved.",
            Self::PickTimeFirst => "Pick a time first.",
            Self::Cleared => "Cleared.",
            Self::PhotoSaved => "Photo saved for offline use.",
            Self::PhotoFailed => "Could not load that photo.",
            Self::PhotoRemoved => "Photo removed.",
            Self::SettingsReset => "Settings reset.",
            Self::SaveFailed => "Could not save settings.",
        }
    }

    /// `true` for messages reporting that the requested action did not happen.
    pub fn is_error(self) -> bool {
        matches!(self, Self::PickTimeFirst | Self::PhotoFailed | Self::SaveFailed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// The currently shown status, if any.
#[derive(Debug, Clone)]
pub struct StatusLine {
    ttl: Duration,
    current: Option<(Status, Instant)>,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_TTL)
    }
}

impl StatusLine {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    /// Shows `status` starting at `now`, replacing any earlier message.
    pub fn set(&mut self, status: Status, now: Instant) {
        self.current = Some((status, now));
    }

    /// The message visible at `now`, dropping it once expired.
    pub fn visible(&mut self, now: Instant) -> Option<Status> {
        let (status, since) = self.current?;
        if now.saturating_duration_since(since) >= self.ttl {
            self.current = None;
            return None;
        }
        Some(status)
    }
}
