//! Domain entities for Oyster Timer.
//!
//! Pure data and rules with no I/O: the persisted [`document::SettingsDocument`]
//! schema and the [`merge`] algorithm that back-fills it from the defaults.
//! Storage adapters live in the `oyster-timer` crate and depend on this module,
//! never the other way round.

/// Settings document schema and its compiled-in defaults.
pub mod document;

/// Deep merge of a stored document onto the defaults.
pub mod merge;
