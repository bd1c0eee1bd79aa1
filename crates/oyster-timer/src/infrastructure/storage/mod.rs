//! Storage infrastructure: program configuration and settings persistence.
//!
//! - **`config`**    – Reads the TOML program configuration from the platform
//!   config directory and resolves the data directory.
//! - **`key_value`** – [`KeyValueStore`](crate::application::settings_store::KeyValueStore)
//!   implementations: one JSON file per key on disk, or an in-memory map.

pub mod config;
pub mod key_value;
