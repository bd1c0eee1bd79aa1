//! Application layer use cases for Oyster Timer.
//!
//! Use cases in this layer drive the pure `oyster_core` functions and reach
//! the outside world only through the traits they define:
//!
//! - [`settings_store::KeyValueStore`] for the persisted document;
//! - [`edit_settings::PhotoIngestor`] for turning an image file into data.
//!
//! # Sub-modules
//!
//! - **`settings_store`** – Loads (failing open to defaults), saves, and
//!   resets the one settings slot.
//!
//! - **`edit_settings`** – Applies every user edit: mutate, persist, then
//!   re-derive the presentation.
//!
//! - **`tick`**   – The once-a-second recompute of the timer text.
//!
//! - **`status`** – Transient acknowledgement messages with a time-to-live.

pub mod edit_settings;
pub mod settings_store;
pub mod status;
pub mod tick;
