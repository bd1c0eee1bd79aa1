//! The persisted settings document.
//!
//! [`SettingsDocument`] is the one and only entity Oyster Timer stores.  It
//! holds the "pulled at" reference instant plus every cosmetic option the
//! settings panel exposes.
//!
//! # Wire format
//!
//! The document is stored as JSON under the `oyster_timer_v1` slot.  Field
//! names are camelCase and are part of that slot's layout, so any document in
//! the slot loads without migration:
//!
//! ```json
//! {
//!   "pulledAtISO": "2024-01-15T09:30:00.000Z",
//!   "text": { "title": "Pearl Point Freshness", "label": "Pulled at" },
//!   "display": { "borderless": false, "hideHeader": false, "hidePulledAtLine": false },
//!   "ui": {
//!     "bg": {
//!       "type": "solid",
//!       "solid": "#0b1220",
//!       "gradA": "#0b1220",
//!       "gradB": "#163257",
//!       "gradAngle": 135,
//!       "photoDataUrl": ""
//!     },
//!     "fontScale": 110,
//!     "fontFamily": "system",
//!     "stylePreset": "clean",
//!     "glow": 25
//!   }
//! }
//! ```
//!
//! No struct here carries `#[serde(default)]`.  Back-fill of missing fields is
//! done exclusively by [`crate::domain::merge::merge_onto_defaults`], which
//! always merges onto a complete default document.
//!
//! # Background variants
//!
//! The background is a sum type (solid / gradient / photo) but it is stored as
//! a *product* of all variant payloads plus an active tag.  Switching the tag
//! never clears the other payloads, so flipping from `photo` to `solid` and
//! back restores the photo.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Title shown when `text.title` is empty or whitespace.
pub const DEFAULT_TITLE: &str = "Pearl Point Freshness";
/// Label shown in front of the pulled-at line when `text.label` is blank.
pub const DEFAULT_LABEL: &str = "Pulled at";
/// Base colour used by the solid default and behind gradients and photos.
pub const DEFAULT_BASE_COLOR: &str = "#0b1220";
/// Second gradient stop of the default document.
pub const DEFAULT_GRADIENT_B: &str = "#163257";
/// Gradient angle of the default document, in degrees.
pub const DEFAULT_GRADIENT_ANGLE: i32 = 135;
/// Font scale of the default document, in percent.
pub const DEFAULT_FONT_SCALE: i32 = 110;
/// Glow intensity of the default document (0–100).
pub const DEFAULT_GLOW: i32 = 25;
/// Upper bound of the glow slider.
pub const MAX_GLOW: i32 = 100;

/// Error returned when a string does not name a known enum value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct UnknownVariantError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

// ── Document ──────────────────────────────────────────────────────────────────

/// The single persisted settings/state object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsDocument {
    /// Reference instant as an RFC 3339 string.  `None` means "not set".
    ///
    /// The raw string is kept rather than a parsed instant: an unparsable
    /// value must still round-trip and render as the placeholder.
    #[serde(
        rename = "pulledAtISO",
        serialize_with = "serialize_pulled_at",
        deserialize_with = "deserialize_pulled_at"
    )]
    pub pulled_at: Option<String>,
    pub text: TextSettings,
    pub display: DisplaySettings,
    pub ui: UiSettings,
}

impl Default for SettingsDocument {
    fn default() -> Self {
        Self {
            pulled_at: None,
            text: TextSettings::default(),
            display: DisplaySettings::default(),
            ui: UiSettings::default(),
        }
    }
}

impl SettingsDocument {
    /// Returns a fresh default document that keeps only `previous.pulled_at`.
    pub fn reset_from(previous: &SettingsDocument) -> Self {
        Self {
            pulled_at: previous.pulled_at.clone(),
            ..Self::default()
        }
    }

    /// The pulled-at string, or `None` when absent or blank.
    pub fn pulled_at(&self) -> Option<&str> {
        self.pulled_at
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Editable header text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSettings {
    pub title: String,
    pub label: String,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            label: DEFAULT_LABEL.to_string(),
        }
    }
}

impl TextSettings {
    /// Title with [`DEFAULT_TITLE`] substituted for a blank value.
    pub fn resolved_title(&self) -> &str {
        non_blank_or(&self.title, DEFAULT_TITLE)
    }

    /// Label with [`DEFAULT_LABEL`] substituted for a blank value.
    pub fn resolved_label(&self) -> &str {
        non_blank_or(&self.label, DEFAULT_LABEL)
    }
}

fn non_blank_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}

/// Window chrome toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    pub borderless: bool,
    pub hide_header: bool,
    pub hide_pulled_at_line: bool,
}

/// Cosmetic options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiSettings {
    #[serde(rename = "bg")]
    pub background: Background,
    /// Percent.  The slider spans roughly 80–200 but the value is not clamped.
    pub font_scale: i32,
    pub font_family: FontFamily,
    pub style_preset: StylePreset,
    /// 0–100.
    pub glow: i32,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            background: Background::default(),
            font_scale: DEFAULT_FONT_SCALE,
            font_family: FontFamily::default(),
            style_preset: StylePreset::default(),
            glow: DEFAULT_GLOW,
        }
    }
}

/// Background settings: the active variant tag plus every variant's payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Background {
    #[serde(rename = "type")]
    pub kind: BackgroundKind,
    /// Colour of the solid variant.
    pub solid: String,
    /// First gradient stop.
    #[serde(rename = "gradA")]
    pub gradient_a: String,
    /// Second gradient stop.
    #[serde(rename = "gradB")]
    pub gradient_b: String,
    /// Gradient direction in degrees.
    #[serde(rename = "gradAngle")]
    pub gradient_angle: i32,
    /// Embeddable image data (`data:image/jpeg;base64,...`), empty when no photo.
    #[serde(rename = "photoDataUrl")]
    pub photo_data_url: String,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            kind: BackgroundKind::default(),
            solid: DEFAULT_BASE_COLOR.to_string(),
            gradient_a: DEFAULT_BASE_COLOR.to_string(),
            gradient_b: DEFAULT_GRADIENT_B.to_string(),
            gradient_angle: DEFAULT_GRADIENT_ANGLE,
            photo_data_url: String::new(),
        }
    }
}

impl Background {
    /// The photo data, or `None` when no photo has been stored.
    pub fn photo(&self) -> Option<&str> {
        Some(self.photo_data_url.as_str()).filter(|s| !s.is_empty())
    }
}

// ── Enumerations ──────────────────────────────────────────────────────────────
//
// All three enums deserialize through `From<String>` so an unrecognised value
// in a stored document degrades to the enum default instead of rejecting the
// whole document.

/// Active background variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum BackgroundKind {
    #[default]
    Solid,
    Gradient,
    Photo,
}

impl BackgroundKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Gradient => "gradient",
            Self::Photo => "photo",
        }
    }
}

impl FromStr for BackgroundKind {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solid" => Ok(Self::Solid),
            "gradient" => Ok(Self::Gradient),
            "photo" => Ok(Self::Photo),
            _ => Err(UnknownVariantError {
                kind: "background type",
                value: s.to_string(),
                expected: "solid, gradient, photo",
            }),
        }
    }
}

impl From<String> for BackgroundKind {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for BackgroundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Font family choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum FontFamily {
    #[default]
    System,
    Mono,
    Serif,
    Round,
}

impl FontFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Mono => "mono",
            Self::Serif => "serif",
            Self::Round => "round",
        }
    }
}

impl FromStr for FontFamily {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "mono" => Ok(Self::Mono),
            "serif" => Ok(Self::Serif),
            "round" => Ok(Self::Round),
            _ => Err(UnknownVariantError {
                kind: "font family",
                value: s.to_string(),
                expected: "system, mono, serif, round",
            }),
        }
    }
}

impl From<String> for FontFamily {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layout preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum StylePreset {
    #[default]
    Clean,
    Dock,
    Bold,
}

impl StylePreset {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Dock => "dock",
            Self::Bold => "bold",
        }
    }
}

impl FromStr for StylePreset {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clean" => Ok(Self::Clean),
            "dock" => Ok(Self::Dock),
            "bold" => Ok(Self::Bold),
            _ => Err(UnknownVariantError {
                kind: "style preset",
                value: s.to_string(),
                expected: "clean, dock, bold",
            }),
        }
    }
}

impl From<String> for StylePreset {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for StylePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── pulledAtISO (de)serialisation ─────────────────────────────────────────────

// "Not set" is an empty string in the `oyster_timer_v1` slot layout.
fn serialize_pulled_at<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(value.as_deref().unwrap_or(""))
}

// Accepts a string, an empty string, or `null`.
fn deserialize_pulled_at<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
