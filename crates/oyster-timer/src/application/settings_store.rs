//! SettingsStore: loads, saves, and resets the persisted settings document.
//!
//! The store sits on top of a single slot in a host-provided key-value store
//! ([`KeyValueStore`]).  The slot holds the whole document serialised as
//! JSON; there is no versioning field.  Older or partial documents are
//! brought up to the current schema by merging them onto the defaults (see
//! [`oyster_core::merge_onto_defaults`]).
//!
//! # Failure policy
//!
//! - **Load fails open.**  A missing slot, an unreadable slot, or text that is
//!   not JSON all yield the default document.  Nothing is raised to the caller.
//! - **Save is surfaced.**  [`SettingsStore::save`] returns a [`StoreError`];
//!   the caller decides how to tell the user.  The in-memory document is never
//!   rolled back.
//! - **Refresh is cheap when nothing changed.**  The store remembers the raw
//!   slot text it last loaded or wrote; [`SettingsStore::load_if_changed`] only
//!   parses and merges when the slot text differs.

use oyster_core::{merge_onto_defaults, SettingsDocument};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Key of the one slot the document lives in.
pub const STORAGE_KEY: &str = "oyster_timer_v1";

/// Error type for key-value backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The key cannot be mapped onto the backend (e.g. contains a path separator).
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    /// The backend refused the write (quota, read-only medium, ...).
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Error type for [`SettingsStore::save`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to persist settings: {0}")]
    Storage(#[from] StorageError),
}

/// A synchronous string key-value store, the persistence boundary.
///
/// Implemented in the infrastructure layer by a file-backed store and an
/// in-memory store.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send {
    /// Returns the value stored under `key`, or `None` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the write does not complete; a failed write
    /// must leave the previous value intact.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Owns the storage handle and the slot key.
pub struct SettingsStore<S> {
    backend: S,
    key: String,
    /// Slot text as of the last load or save; `None` for an absent slot.
    last_seen: Option<String>,
}

impl<S: KeyValueStore> SettingsStore<S> {
    /// Creates a store over `backend` using [`STORAGE_KEY`].
    pub fn new(backend: S) -> Self {
        Self::with_key(backend, STORAGE_KEY)
    }

    /// Creates a store over `backend` using a custom slot key.
    pub fn with_key(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            last_seen: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loads the document, back-filling missing fields from the defaults.
    ///
    /// Never fails: any read or parse problem yields the default document.
    pub fn load(&self) -> SettingsDocument {
        match self.backend.get(&self.key) {
            Ok(raw) => self.parse(raw.as_deref()),
            Err(e) => {
                warn!("could not read stored settings: {e}; using defaults");
                SettingsDocument::default()
            }
        }
    }

    /// Loads the document only if the slot text changed since the last load
    /// or save through this store.
    ///
    /// Returns `None` when the slot is unchanged or cannot be read; a failed
    /// read never replaces a document the caller already holds.
    pub fn load_if_changed(&mut self) -> Option<SettingsDocument> {
        let raw = match self.backend.get(&self.key) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("could not re-read stored settings: {e}");
                return None;
            }
        };
        if raw == self.last_seen {
            return None;
        }
        let doc = self.parse(raw.as_deref());
        self.last_seen = raw;
        Some(doc)
    }

    fn parse(&self, raw: Option<&str>) -> SettingsDocument {
        let Some(raw) = raw else {
            debug!("no stored settings under '{}'; using defaults", self.key);
            return SettingsDocument::default();
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(parsed) => merge_onto_defaults(&parsed),
            Err(e) => {
                warn!("stored settings are not valid JSON: {e}; using defaults");
                SettingsDocument::default()
            }
        }
    }

    /// Serialises and persists the full document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if serialisation or the backend write fails.
    pub fn save(&mut self, doc: &SettingsDocument) -> Result<(), StoreError> {
        let text = serde_json::to_string(doc)?;
        self.backend.set(&self.key, &text)?;
        debug!("saved settings ({} bytes)", text.len());
        self.last_seen = Some(text);
        Ok(())
    }

    /// Replaces the stored document with the defaults, keeping only
    /// `previous.pulled_at`, and persists it immediately.
    ///
    /// The reset document is returned even when persisting fails; the second
    /// element reports the save outcome.
    pub fn reset(&mut self, previous: &SettingsDocument) -> (SettingsDocument, Result<(), StoreError>) {
        let doc = SettingsDocument::reset_from(previous);
        let saved = self.save(&doc);
        (doc, saved)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
