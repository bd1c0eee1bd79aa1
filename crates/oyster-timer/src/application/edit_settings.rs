//! EditSettingsUseCase: every user edit of the settings document.
//!
//! [`SettingsEditor`] owns the live document and the [`SettingsStore`] behind
//! it.  Each mutation follows the same three steps, in order, before
//! returning:
//!
//! 1. change the in-memory document;
//! 2. persist it synchronously;
//! 3. re-derive the [`Presentation`] and hand it back with an optional
//!    [`Status`] acknowledgement.
//!
//! If step 2 fails the change is kept in memory and the outcome carries
//! [`Status::SaveFailed`]; the UI stays live.
//!
//! # Photo ingestion
//!
//! [`SettingsEditor::apply_photo`] is the only asynchronous edit.  The
//! document is not touched until the [`PhotoIngestor`] has produced the
//! encoded image, so a failed or slow decode can never leave a half-applied
//! change behind.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use oyster_core::{
    derive_presentation, from_local_field, to_iso_string, BackgroundKind, DisplaySettings,
    FontFamily, Presentation, SettingsDocument, StylePreset, TimeFieldError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::settings_store::{KeyValueStore, SettingsStore};
use super::status::Status;
use super::tick::{tick_frame, TickFrame};
use oyster_core::domain::document::MAX_GLOW;

/// Error type for photo ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("could not encode image: {0}")]
    Encode(String),

    /// The background worker panicked or was cancelled.
    #[error("image worker failed: {0}")]
    Worker(String),
}

/// Turns a user-selected image file into embeddable image data.
#[async_trait]
pub trait PhotoIngestor: Send + Sync {
    /// Decodes, downsamples, and re-encodes the image at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] if the file cannot be read, decoded, or encoded.
    async fn ingest(&self, path: &Path) -> Result<String, IngestError>;
}

/// Result of one edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub presentation: Presentation,
    pub status: Option<Status>,
}

/// Owns the live settings document and applies user edits to it.
pub struct SettingsEditor<S, Tz: TimeZone> {
    store: SettingsStore<S>,
    doc: SettingsDocument,
    tz: Tz,
    /// The in-memory document holds a change the last save did not persist.
    unsaved: bool,
}

impl<S, Tz> SettingsEditor<S, Tz>
where
    S: KeyValueStore,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    /// Loads the document from `store` and formats local times in `tz`.
    pub fn open(mut store: SettingsStore<S>, tz: Tz) -> Self {
        let doc = store.load_if_changed().unwrap_or_default();
        Self {
            store,
            doc,
            tz,
            unsaved: false,
        }
    }

    pub fn document(&self) -> &SettingsDocument {
        &self.doc
    }

    pub fn presentation(&self) -> Presentation {
        derive_presentation(&self.doc, &self.tz)
    }

    /// The live timer frame at `now`.
    pub fn tick(&self, now: DateTime<Utc>) -> TickFrame {
        tick_frame(&self.doc, now, &self.tz)
    }

    /// `true` while the in-memory document differs from what was last saved.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Re-reads the document from storage, picking up edits made elsewhere.
    ///
    /// Skipped while the last save failed so the unsaved change is not
    /// overwritten.  An unchanged slot is not parsed again.  Returns whether
    /// the document was replaced.
    pub fn reload(&mut self) -> bool {
        if self.unsaved {
            return false;
        }
        match self.store.load_if_changed() {
            Some(doc) => {
                self.doc = doc;
                true
            }
            None => false,
        }
    }

    // ── Pulled-at ─────────────────────────────────────────────────────────────

    /// Stores `now` as the pulled-at instant.
    pub fn set_pulled_at_now(&mut self, now: DateTime<Utc>) -> EditOutcome {
        self.doc.pulled_at = Some(to_iso_string(&now));
        self.commit(Some(Status::SetToNow))
    }

    /// Stores the instant named by a local datetime field.
    ///
    /// A blank field aborts with [`Status::PickTimeFirst`].  A field that is
    /// present but not a valid local time is stored as "not set".
    pub fn save_pulled_at(&mut self, field: &str) -> EditOutcome {
        match from_local_field(field, &self.tz) {
            Err(TimeFieldError::Empty) => self.unchanged(Status::PickTimeFirst),
            Ok(instant) => {
                self.doc.pulled_at = Some(to_iso_string(&instant));
                self.commit(Some(Status::Saved))
            }
            Err(e) => {
                debug!("storing unparsable pulled-at field as unset: {e}");
                self.doc.pulled_at = None;
                self.commit(Some(Status::Saved))
            }
        }
    }

    pub fn clear_pulled_at(&mut self) -> EditOutcome {
        self.doc.pulled_at = None;
        self.commit(Some(Status::Cleared))
    }

    // ── Background ────────────────────────────────────────────────────────────

    /// Switches the active background variant; the other payloads are kept.
    pub fn set_background_kind(&mut self, kind: BackgroundKind) -> EditOutcome {
        self.doc.ui.background.kind = kind;
        self.commit(None)
    }

    pub fn set_solid_color(&mut self, color: impl Into<String>) -> EditOutcome {
        self.doc.ui.background.solid = color.into();
        self.commit(None)
    }

    pub fn set_gradient_a(&mut self, color: impl Into<String>) -> EditOutcome {
        self.doc.ui.background.gradient_a = color.into();
        self.commit(None)
    }

    pub fn set_gradient_b(&mut self, color: impl Into<String>) -> EditOutcome {
        self.doc.ui.background.gradient_b = color.into();
        self.commit(None)
    }

    pub fn set_gradient_angle(&mut self, degrees: i32) -> EditOutcome {
        self.doc.ui.background.gradient_angle = degrees;
        self.commit(None)
    }

    /// Ingests the photo at `path` and makes it the active background.
    ///
    /// On failure the document is left unchanged and the outcome carries
    /// [`Status::PhotoFailed`].
    pub async fn apply_photo(&mut self, path: &Path, ingestor: &dyn PhotoIngestor) -> EditOutcome {
        match ingestor.ingest(path).await {
            Ok(data_url) => {
                info!("photo ingested from {} ({} bytes)", path.display(), data_url.len());
                self.doc.ui.background.photo_data_url = data_url;
                self.doc.ui.background.kind = BackgroundKind::Photo;
                self.commit(Some(Status::PhotoSaved))
            }
            Err(e) => {
                warn!("photo ingestion failed: {e}");
                self.unchanged(Status::PhotoFailed)
            }
        }
    }

    /// Drops the stored photo; the active variant is left as is.
    pub fn remove_photo(&mut self) -> EditOutcome {
        self.doc.ui.background.photo_data_url.clear();
        self.commit(Some(Status::PhotoRemoved))
    }

    // ── Typography & style ────────────────────────────────────────────────────

    /// Sets the font scale in percent.  Not clamped.
    pub fn set_font_scale(&mut self, percent: i32) -> EditOutcome {
        self.doc.ui.font_scale = percent;
        self.commit(None)
    }

    pub fn set_font_family(&mut self, family: FontFamily) -> EditOutcome {
        self.doc.ui.font_family = family;
        self.commit(None)
    }

    pub fn set_style_preset(&mut self, preset: StylePreset) -> EditOutcome {
        self.doc.ui.style_preset = preset;
        self.commit(None)
    }

    /// Sets the glow intensity, clamped to 0–100.
    pub fn set_glow(&mut self, glow: i32) -> EditOutcome {
        self.doc.ui.glow = glow.clamp(0, MAX_GLOW);
        self.commit(None)
    }

    // ── Text & chrome ─────────────────────────────────────────────────────────

    pub fn set_title(&mut self, title: impl Into<String>) -> EditOutcome {
        self.doc.text.title = title.into();
        self.commit(None)
    }

    pub fn set_label(&mut self, label: impl Into<String>) -> EditOutcome {
        self.doc.text.label = label.into();
        self.commit(None)
    }

    pub fn set_display(&mut self, display: DisplaySettings) -> EditOutcome {
        self.doc.display = display;
        self.commit(None)
    }

    // ── Reset ─────────────────────────────────────────────────────────────────

    /// Restores every default except the pulled-at instant.
    pub fn reset(&mut self) -> EditOutcome {
        let (doc, saved) = self.store.reset(&self.doc);
        self.doc = doc;
        self.unsaved = saved.is_err();
        let status = match saved {
            Ok(()) => Status::SettingsReset,
            Err(e) => {
                warn!("settings reset was not persisted: {e}");
                Status::SaveFailed
            }
        };
        self.outcome(Some(status))
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn commit(&mut self, status: Option<Status>) -> EditOutcome {
        match self.store.save(&self.doc) {
            Ok(()) => {
                self.unsaved = false;
                self.outcome(status)
            }
            Err(e) => {
                warn!("settings change kept in memory only: {e}");
                self.unsaved = true;
                self.outcome(Some(Status::SaveFailed))
            }
        }
    }

    fn unchanged(&self, status: Status) -> EditOutcome {
        self.outcome(Some(status))
    }

    /// The current presentation with an optional status, without editing.
    pub fn outcome(&self, status: Option<Status>) -> EditOutcome {
        EditOutcome {
            presentation: self.presentation(),
            status,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
