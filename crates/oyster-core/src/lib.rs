//! # oyster-core
//!
//! Pure state and render core for Oyster Timer, a small "time since" display:
//! the user picks a *pulled at* instant and the screen counts up from it.
//!
//! This crate has no I/O.  It defines:
//!
//! - **`domain`** – the persisted [`SettingsDocument`] schema, its compiled-in
//!   defaults, and the deep-merge that back-fills partially stored documents.
//!
//! - **`presentation`** – the functions that turn a document into something to
//!   draw: elapsed-time formatting, local datetime conversions, and the
//!   [`Presentation`] descriptor (background directive, font stack, scale,
//!   glow, and the values a settings panel mirrors).
//!
//! Persistence, the tick loop, and the terminal front end live in the
//! `oyster-timer` crate.

pub mod domain;
pub mod presentation;

pub use domain::document::{
    Background, BackgroundKind, DisplaySettings, FontFamily, SettingsDocument, StylePreset,
    TextSettings, UiSettings, UnknownVariantError,
};
pub use domain::merge::{merge_deep, merge_onto_defaults, try_merge_onto_defaults, MergeError};
pub use presentation::descriptor::{derive_presentation, BackgroundStyle, ControlsMirror, Presentation};
pub use presentation::duration::{compute_elapsed, format_duration, Elapsed, PLACEHOLDER};
pub use presentation::local_time::{
    format_pulled_at_label, from_local_field, to_iso_string, to_local_field, TimeFieldError,
};
