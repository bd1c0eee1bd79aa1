//! State → presentation: [`derive_presentation`] and its descriptor types.
//!
//! The descriptor carries everything a rendering layer needs to draw the timer
//! screen and keep a settings panel in sync, without the renderer having to
//! know any of the document's defaulting rules:
//!
//! | Field                | Web equivalent                                 |
//! |----------------------|------------------------------------------------|
//! | `background.image`   | `background-image` on the app container        |
//! | `background.base_color` | `--bg` custom property                      |
//! | `font_stack`         | `--font` custom property                       |
//! | `scale` / `glow`     | `--scale` / `--glow` custom properties         |
//! | `style_class`        | `style-clean` / `style-dock` / `style-bold`    |
//! | `controls`           | the values every settings control should show  |

use std::fmt::Display;

use chrono::TimeZone;
use serde::Serialize;

use super::local_time::stored_to_local_field;
use crate::domain::document::{
    Background, BackgroundKind, DisplaySettings, FontFamily, SettingsDocument, StylePreset,
    DEFAULT_BASE_COLOR,
};

const SYSTEM_FONT_STACK: &str = r#"ui-sans-serif, system-ui, -apple-system, "SF Pro Display", "SF Pro Text", Segoe UI, Roboto, Helvetica, Arial, sans-serif"#;
const MONO_FONT_STACK: &str = r#"ui-monospace, SFMono-Regular, Menlo, Monaco, Consolas, "Liberation Mono", "Courier New", monospace"#;
const SERIF_FONT_STACK: &str = r#"ui-serif, "Iowan Old Style", "Palatino Linotype", Palatino, Georgia, serif"#;
const ROUND_FONT_STACK: &str = r#"ui-sans-serif, system-ui, -apple-system, "SF Pro Rounded", "Arial Rounded MT Bold", "Trebuchet MS", Arial, sans-serif"#;

/// Everything needed to render the current document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Presentation {
    /// Header title with the default substituted for a blank value.
    pub title: String,
    /// Pulled-at line label with the default substituted for a blank value.
    pub label: String,
    pub style_class: String,
    pub font_stack: &'static str,
    pub scale: i32,
    pub glow: i32,
    pub background: BackgroundStyle,
    pub display: DisplaySettings,
    pub controls: ControlsMirror,
}

/// Resolved background directive for the active variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackgroundStyle {
    pub kind: BackgroundKind,
    /// `none`, `linear-gradient(...)`, or `url("...")`.
    pub image: String,
    /// Colour painted under (or instead of) the image.
    pub base_color: String,
}

/// Raw field values mirrored into the settings controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlsMirror {
    /// Local datetime field (`YYYY-MM-DDTHH:MM`), empty when unset.
    pub pulled_at_field: String,
    pub background_kind: BackgroundKind,
    /// Which background control group is shown (always the active kind).
    pub visible_background_controls: BackgroundKind,
    pub solid_color: String,
    pub gradient_a: String,
    pub gradient_b: String,
    pub gradient_angle: i32,
    pub has_photo: bool,
    pub font_scale: i32,
    pub font_family: FontFamily,
    pub style_preset: StylePreset,
    pub glow: i32,
    pub title: String,
    pub label: String,
}

/// Font stack for a family choice.
pub fn font_stack(family: FontFamily) -> &'static str {
    match family {
        FontFamily::System => SYSTEM_FONT_STACK,
        FontFamily::Mono => MONO_FONT_STACK,
        FontFamily::Serif => SERIF_FONT_STACK,
        FontFamily::Round => ROUND_FONT_STACK,
    }
}

/// CSS-style class for a layout preset.
pub fn style_class(preset: StylePreset) -> String {
    format!("style-{}", preset.as_str())
}

/// Resolves the active background variant.
///
/// A photo variant with no stored image falls back to no image over the
/// default base colour.
pub fn background_style(bg: &Background) -> BackgroundStyle {
    let (image, base_color) = match bg.kind {
        BackgroundKind::Solid => ("none".to_string(), bg.solid.clone()),
        BackgroundKind::Gradient => (
            format!(
                "linear-gradient({}deg, {}, {})",
                bg.gradient_angle, bg.gradient_a, bg.gradient_b
            ),
            DEFAULT_BASE_COLOR.to_string(),
        ),
        BackgroundKind::Photo => (
            bg.photo()
                .map(|data| format!("url(\"{data}\")"))
                .unwrap_or_else(|| "none".to_string()),
            DEFAULT_BASE_COLOR.to_string(),
        ),
    };
    BackgroundStyle {
        kind: bg.kind,
        image,
        base_color,
    }
}

/// Derives the presentation descriptor for `doc`, formatting local times in `tz`.
///
/// Pure: the same document and zone always yield the same descriptor.
pub fn derive_presentation<Tz>(doc: &SettingsDocument, tz: &Tz) -> Presentation
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let ui = &doc.ui;
    let bg = &ui.background;

    Presentation {
        title: doc.text.resolved_title().to_string(),
        label: doc.text.resolved_label().to_string(),
        style_class: style_class(ui.style_preset),
        font_stack: font_stack(ui.font_family),
        scale: ui.font_scale,
        glow: ui.glow,
        background: background_style(bg),
        display: doc.display,
        controls: ControlsMirror {
            pulled_at_field: stored_to_local_field(doc.pulled_at(), tz),
            background_kind: bg.kind,
            visible_background_controls: bg.kind,
            solid_color: bg.solid.clone(),
            gradient_a: bg.gradient_a.clone(),
            gradient_b: bg.gradient_b.clone(),
            gradient_angle: bg.gradient_angle,
            has_photo: bg.photo().is_some(),
            font_scale: ui.font_scale,
            font_family: ui.font_family,
            style_preset: ui.style_preset,
            glow: ui.glow,
            title: doc.text.title.clone(),
            label: doc.text.label.clone(),
        },
    }
}
