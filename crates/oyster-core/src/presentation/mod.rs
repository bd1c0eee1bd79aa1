//! Presentation engine: pure functions from a settings snapshot to what the
//! screen shows.
//!
//! Two cadences drive this module:
//!
//! - **On mutation** – after every settings edit the caller re-runs
//!   [`descriptor::derive_presentation`] to restyle the screen and refresh the
//!   settings controls.
//! - **Every second** – the tick loop calls [`duration::compute_elapsed`] and
//!   [`duration::format_duration`] against the live clock.  Nothing is carried
//!   over between ticks, so a late or skipped tick simply shows the right value
//!   on the next one.
//!
//! Time-zone dependent helpers are generic over [`chrono::TimeZone`]; the
//! binary passes [`chrono::Local`], tests pass fixed offsets.

/// State → presentation descriptor.
pub mod descriptor;

/// Elapsed-time computation and `HH:MM:SS` formatting.
pub mod duration;

/// Local datetime field conversions and the human pulled-at label.
pub mod local_time;
