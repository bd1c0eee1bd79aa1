//! Integration tests for the settings lifecycle on a real data directory.
//!
//! # Purpose
//!
//! These tests drive `SettingsEditor` over `FileKeyValueStore` the same way
//! the binary does, then reopen the directory with a fresh editor to check
//! what actually reached disk:
//!
//! - Every edit is on disk before the call returns.
//! - A reset keeps the pulled-at instant and nothing else.
//! - A corrupt or foreign slot loads as defaults and is repaired on save.
//! - Two editors on one directory see each other's changes after `reload`.
//! - A photo goes through decode, downsample, and re-encode before it is stored.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use oyster_core::{BackgroundKind, FontFamily, SettingsDocument, StylePreset};
use oyster_timer::application::edit_settings::SettingsEditor;
use oyster_timer::application::settings_store::{SettingsStore, STORAGE_KEY};
use oyster_timer::application::status::Status;
use oyster_timer::infrastructure::image_ingest::JpegDataUrlIngestor;
use oyster_timer::infrastructure::storage::key_value::FileKeyValueStore;
use uuid::Uuid;

// ── Helpers ───────────────────────────────────────────────────────────────────

struct TempDir(PathBuf);

impl TempDir {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("oyster_it_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    fn path(&self) -> &Path {
        &self.0
    }

    fn slot(&self) -> PathBuf {
        self.0.join(format!("{STORAGE_KEY}.json"))
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.0).ok();
    }
}

fn open(dir: &Path) -> SettingsEditor<FileKeyValueStore, Utc> {
    SettingsEditor::open(SettingsStore::new(FileKeyValueStore::new(dir)), Utc)
}

fn stored(dir: &TempDir) -> serde_json::Value {
    let text = std::fs::read_to_string(dir.slot()).expect("slot file");
    serde_json::from_str(&text).expect("slot is JSON")
}

// ── Persistence ───────────────────────────────────────────────────────────────

#[test]
fn test_fresh_directory_loads_defaults_without_writing() {
    let dir = TempDir::new();

    let editor = open(dir.path());

    assert_eq!(*editor.document(), SettingsDocument::default());
    assert!(!dir.slot().exists());
}

#[test]
fn test_edits_survive_reopening() {
    // Arrange
    let dir = TempDir::new();
    let mut editor = open(dir.path());

    // Act
    editor.save_pulled_at("2024-01-15T09:30");
    editor.set_font_family(FontFamily::Serif);
    editor.set_style_preset(StylePreset::Dock);
    editor.set_title("Tray 12");
    let reopened = open(dir.path());

    // Assert
    assert_eq!(reopened.document(), editor.document());
    assert_eq!(
        reopened.document().pulled_at.as_deref(),
        Some("2024-01-15T09:30:00.000Z")
    );
    let json = stored(&dir);
    assert_eq!(json["pulledAtISO"], "2024-01-15T09:30:00.000Z");
    assert_eq!(json["ui"]["fontFamily"], "serif");
    assert_eq!(json["text"]["title"], "Tray 12");
}

#[test]
fn test_cleared_pulled_at_is_stored_as_empty_string() {
    let dir = TempDir::new();
    let mut editor = open(dir.path());
    editor.set_pulled_at_now(Utc::now());

    editor.clear_pulled_at();

    assert_eq!(stored(&dir)["pulledAtISO"], "");
    assert_eq!(open(dir.path()).document().pulled_at, None);
}

#[test]
fn test_reset_keeps_only_pulled_at() {
    // Arrange
    let dir = TempDir::new();
    let mut editor = open(dir.path());
    editor.save_pulled_at("2024-06-01T07:00");
    editor.set_glow(90);
    editor.set_background_kind(BackgroundKind::Gradient);
    editor.set_label("Opened");

    // Act
    let outcome = editor.reset();

    // Assert
    assert_eq!(outcome.status, Some(Status::SettingsReset));
    let mut expected = SettingsDocument::default();
    expected.pulled_at = Some("2024-06-01T07:00:00.000Z".to_string());
    assert_eq!(*open(dir.path()).document(), expected);
}

#[test]
fn test_corrupt_slot_loads_defaults_and_is_repaired_on_save() {
    // Arrange
    let dir = TempDir::new();
    std::fs::write(dir.slot(), "{ this is not json").unwrap();

    // Act
    let mut editor = open(dir.path());
    assert_eq!(*editor.document(), SettingsDocument::default());
    editor.set_glow(40);

    // Assert
    assert_eq!(stored(&dir)["ui"]["glow"], 40);
}

#[test]
fn test_legacy_partial_document_is_back_filled() {
    // Arrange: an older app version that only knew about the timer and a solid background
    let dir = TempDir::new();
    std::fs::write(
        dir.slot(),
        r##"{"pulledAtISO":"2023-11-05T12:00:00.000Z","ui":{"bg":{"type":"solid","solid":"#222222"}}}"##,
    )
    .unwrap();

    // Act
    let editor = open(dir.path());

    // Assert
    let doc = editor.document();
    assert_eq!(doc.pulled_at.as_deref(), Some("2023-11-05T12:00:00.000Z"));
    assert_eq!(doc.ui.background.solid, "#222222");
    assert_eq!(doc.ui.font_scale, SettingsDocument::default().ui.font_scale);
    assert_eq!(doc.text, SettingsDocument::default().text);
}

#[test]
fn test_two_editors_see_each_other_after_reload() {
    let dir = TempDir::new();
    let mut watcher = open(dir.path());
    let mut other = open(dir.path());

    other.set_pulled_at_now(Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap());
    assert!(watcher.reload());

    let frame = watcher.tick(Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 5).unwrap());
    assert_eq!(frame.timer_text, "01:00:05");
}

#[test]
fn test_no_temp_file_is_left_behind() {
    let dir = TempDir::new();
    let mut editor = open(dir.path());

    for glow in 0..5 {
        editor.set_glow(glow * 10);
    }

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![format!("{STORAGE_KEY}.json")]);
}

// ── Photo ingestion ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_photo_is_downsampled_and_persisted() {
    // Arrange
    let dir = TempDir::new();
    let photo = dir.path().join("wide.png");
    let mut png = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(640, 320, Rgba([10, 80, 160, 255])))
        .write_to(&mut png, ImageFormat::Png)
        .unwrap();
    std::fs::write(&photo, png.into_inner()).unwrap();
    let mut editor = open(dir.path());

    // Act
    let outcome = editor
        .apply_photo(&photo, &JpegDataUrlIngestor::new(320, 78))
        .await;

    // Assert
    assert_eq!(outcome.status, Some(Status::PhotoSaved));
    let reopened = open(dir.path());
    let bg = &reopened.document().ui.background;
    assert_eq!(bg.kind, BackgroundKind::Photo);
    assert!(bg.photo_data_url.starts_with("data:image/jpeg;base64,"));
    assert!(outcome.presentation.controls.has_photo);
}

#[tokio::test]
async fn test_unreadable_photo_leaves_stored_document_alone() {
    let dir = TempDir::new();
    let mut editor = open(dir.path());
    editor.set_glow(33);

    let outcome = editor
        .apply_photo(&dir.path().join("missing.jpg"), &JpegDataUrlIngestor::default())
        .await;

    assert_eq!(outcome.status, Some(Status::PhotoFailed));
    let json = stored(&dir);
    assert_eq!(json["ui"]["glow"], 33);
    assert_eq!(json["ui"]["bg"]["type"], "solid");
}
