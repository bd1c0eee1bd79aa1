//! Edit commands shared by the command line and the interactive session.
//!
//! The same [`EditCommand`] enum is flattened into the binary's subcommands
//! (`oyster-timer glow 40`) and parsed from each line typed into a running
//! `watch` session (`glow 40`).

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use oyster_core::{BackgroundKind, FontFamily, StylePreset};

use crate::application::edit_settings::{EditOutcome, PhotoIngestor, SettingsEditor};
use crate::application::settings_store::KeyValueStore;

/// One edit of the settings document.
///
/// Choice arguments parse with `FromStr` so unknown names are rejected; the
/// lenient `From<String>` conversions are for stored documents only.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum EditCommand {
    /// Set the pulled-at time from a local `YYYY-MM-DDTHH:MM` value.
    Set {
        /// Local date and time, e.g. `2024-01-15T09:30`.
        local: String,
    },

    /// Set the pulled-at time to now.
    Now,

    /// Clear the pulled-at time.
    Clear,

    /// Change the background.
    #[command(subcommand)]
    Bg(BackgroundCommand),

    /// Change the font size and family.
    Font {
        /// Scale in percent.
        #[arg(long, allow_negative_numbers = true)]
        scale: Option<i32>,
        /// `system`, `mono`, `serif`, or `round`.
        #[arg(long, value_parser = FontFamily::from_str)]
        family: Option<FontFamily>,
    },

    /// Pick a layout preset: `clean`, `dock`, or `bold`.
    Style {
        #[arg(value_parser = StylePreset::from_str)]
        preset: StylePreset,
    },

    /// Set glow intensity, 0–100.
    Glow {
        #[arg(allow_negative_numbers = true)]
        value: i32,
    },

    /// Change the title or the pulled-at label.
    Text {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        label: Option<String>,
    },

    /// Toggle display chrome.
    Display {
        #[arg(long)]
        borderless: Option<bool>,
        #[arg(long)]
        hide_header: Option<bool>,
        #[arg(long)]
        hide_pulled_at_line: Option<bool>,
    },

    /// Restore default settings, keeping the pulled-at time.
    Reset,
}

/// Background edits.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum BackgroundCommand {
    /// Switch the active background: `solid`, `gradient`, or `photo`.
    Type {
        #[arg(value_parser = BackgroundKind::from_str)]
        kind: BackgroundKind,
    },

    /// Set the solid colour.
    Solid { color: String },

    /// Set both gradient colours and optionally the angle.
    Gradient {
        a: String,
        b: String,
        #[arg(long, allow_negative_numbers = true)]
        angle: Option<i32>,
    },

    /// Set the gradient angle in degrees.
    Angle {
        #[arg(allow_negative_numbers = true)]
        degrees: i32,
    },

    /// Use an image file as the background photo.
    Photo { path: PathBuf },

    /// Remove the stored photo.
    RemovePhoto,
}

impl EditCommand {
    /// Applies the command through `editor`.
    ///
    /// Commands that set several fields apply them in order; the outcome of
    /// the last one is returned.  A command with nothing to change returns
    /// the current presentation with no status.
    pub async fn apply<S, Tz>(
        self,
        editor: &mut SettingsEditor<S, Tz>,
        ingestor: &dyn PhotoIngestor,
        now: DateTime<Utc>,
    ) -> EditOutcome
    where
        S: KeyValueStore,
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        match self {
            Self::Set { local } => editor.save_pulled_at(&local),
            Self::Now => editor.set_pulled_at_now(now),
            Self::Clear => editor.clear_pulled_at(),
            Self::Bg(bg) => bg.apply(editor, ingestor).await,
            Self::Font { scale, family } => {
                let mut outcome = None;
                if let Some(scale) = scale {
                    outcome = Some(editor.set_font_scale(scale));
                }
                if let Some(family) = family {
                    outcome = Some(editor.set_font_family(family));
                }
                outcome.unwrap_or_else(|| editor.outcome(None))
            }
            Self::Style { preset } => editor.set_style_preset(preset),
            Self::Glow { value } => editor.set_glow(value),
            Self::Text { title, label } => {
                let mut outcome = None;
                if let Some(title) = title {
                    outcome = Some(editor.set_title(title));
                }
                if let Some(label) = label {
                    outcome = Some(editor.set_label(label));
                }
                outcome.unwrap_or_else(|| editor.outcome(None))
            }
            Self::Display {
                borderless,
                hide_header,
                hide_pulled_at_line,
            } => {
                if borderless.is_none() && hide_header.is_none() && hide_pulled_at_line.is_none() {
                    return editor.outcome(None);
                }
                let mut display = editor.document().display;
                display.borderless = borderless.unwrap_or(display.borderless);
                display.hide_header = hide_header.unwrap_or(display.hide_header);
                display.hide_pulled_at_line = hide_pulled_at_line.unwrap_or(display.hide_pulled_at_line);
                editor.set_display(display)
            }
            Self::Reset => editor.reset(),
        }
    }
}

impl BackgroundCommand {
    async fn apply<S, Tz>(self, editor: &mut SettingsEditor<S, Tz>, ingestor: &dyn PhotoIngestor) -> EditOutcome
    where
        S: KeyValueStore,
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        match self {
            Self::Type { kind } => editor.set_background_kind(kind),
            Self::Solid { color } => editor.set_solid_color(color),
            Self::Gradient { a, b, angle } => {
                editor.set_gradient_a(a);
                let outcome = editor.set_gradient_b(b);
                match angle {
                    Some(degrees) => editor.set_gradient_angle(degrees),
                    None => outcome,
                }
            }
            Self::Angle { degrees } => editor.set_gradient_angle(degrees),
            Self::Photo { path } => editor.apply_photo(&path, ingestor).await,
            Self::RemovePhoto => editor.remove_photo(),
        }
    }
}

// ── Session line parsing ──────────────────────────────────────────────────────

/// A line typed into a running session.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum SessionCommand {
    #[command(flatten)]
    Edit(EditCommand),

    /// Print the current settings again.
    Show,

    /// Leave the session.
    #[command(visible_alias = "exit")]
    Quit,
}

#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct SessionLine {
    #[command(subcommand)]
    command: SessionCommand,
}

/// Error type for [`parse_session_line`].
#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("unterminated quote")]
    UnterminatedQuote,

    /// Includes `help` requests; the message is clap's rendered text.
    #[error("{0}")]
    Usage(String),
}

/// Parses one session line.  Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns [`LineError`] for unbalanced quotes or arguments clap rejects.
pub fn parse_session_line(line: &str) -> Result<Option<SessionCommand>, LineError> {
    let words = split_words(line)?;
    if words.is_empty() {
        return Ok(None);
    }
    SessionLine::try_parse_from(words)
        .map(|parsed| Some(parsed.command))
        .map_err(|e| LineError::Usage(e.render().to_string()))
}

/// Splits on whitespace, honouring `'single'` and `"double"` quotes.
///
/// A backslash inside double quotes escapes the next character.
pub fn split_words(line: &str) -> Result<Vec<String>, LineError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(inner) => current.push(inner),
                        None => return Err(LineError::UnterminatedQuote),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped) => current.push(escaped),
                            None => return Err(LineError::UnterminatedQuote),
                        },
                        Some(inner) => current.push(inner),
                        None => return Err(LineError::UnterminatedQuote),
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::edit_settings::IngestError;
    use crate::application::settings_store::SettingsStore;
    use crate::infrastructure::storage::key_value::MemoryKeyValueStore;
    use async_trait::async_trait;
    use std::path::Path;

    struct NoPhotos;

    #[async_trait]
    impl PhotoIngestor for NoPhotos {
        async fn ingest(&self, path: &Path) -> Result<String, IngestError> {
            Err(IngestError::Decode(format!("{} not available in tests", path.display())))
        }
    }

    fn editor() -> SettingsEditor<MemoryKeyValueStore, Utc> {
        SettingsEditor::open(SettingsStore::new(MemoryKeyValueStore::new()), Utc)
    }

    fn parse(line: &str) -> SessionCommand {
        parse_session_line(line).unwrap().expect("a command")
    }

    #[test]
    fn test_split_words_honours_quotes() {
        assert_eq!(
            split_words(r#"text --title "Tray 9" --label 'Opened at'"#).unwrap(),
            vec!["text", "--title", "Tray 9", "--label", "Opened at"]
        );
        assert_eq!(split_words(r#"text --title "say \"hi\"""#).unwrap()[2], r#"say "hi""#);
        assert_eq!(split_words("  ").unwrap(), Vec::<String>::new());
        assert_eq!(split_words(r#"text --title """#).unwrap()[2], "");
    }

    #[test]
    fn test_split_words_rejects_unterminated_quote() {
        assert!(matches!(split_words("text --title \"oops"), Err(LineError::UnterminatedQuote)));
    }

    #[test]
    fn test_parse_session_line_recognises_edits() {
        assert_eq!(parse("now"), SessionCommand::Edit(EditCommand::Now));
        assert_eq!(
            parse("glow -5"),
            SessionCommand::Edit(EditCommand::Glow { value: -5 })
        );
        assert_eq!(
            parse("bg type gradient"),
            SessionCommand::Edit(EditCommand::Bg(BackgroundCommand::Type {
                kind: BackgroundKind::Gradient
            }))
        );
        assert_eq!(
            parse("font --family MONO"),
            SessionCommand::Edit(EditCommand::Font {
                scale: None,
                family: Some(FontFamily::Mono)
            })
        );
    }

    #[test]
    fn test_parse_session_line_session_commands() {
        assert_eq!(parse("quit"), SessionCommand::Quit);
        assert_eq!(parse("exit"), SessionCommand::Quit);
        assert_eq!(parse("show"), SessionCommand::Show);
        assert_eq!(parse_session_line("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_session_line_rejects_unknown_values() {
        let err = parse_session_line("style fancy").unwrap_err();
        assert!(matches!(err, LineError::Usage(msg) if msg.contains("fancy")));
    }

    #[tokio::test]
    async fn test_apply_font_sets_both_fields() {
        // Arrange
        let mut editor = editor();
        let cmd = EditCommand::Font {
            scale: Some(150),
            family: Some(FontFamily::Round),
        };

        // Act
        let outcome = cmd.apply(&mut editor, &NoPhotos, Utc::now()).await;

        // Assert
        assert_eq!(outcome.presentation.scale, 150);
        assert_eq!(editor.document().ui.font_family, FontFamily::Round);
    }

    #[tokio::test]
    async fn test_apply_display_changes_only_named_flags() {
        let mut editor = editor();
        EditCommand::Display {
            borderless: Some(true),
            hide_header: None,
            hide_pulled_at_line: None,
        }
        .apply(&mut editor, &NoPhotos, Utc::now())
        .await;

        let outcome = EditCommand::Display {
            borderless: None,
            hide_header: Some(true),
            hide_pulled_at_line: None,
        }
        .apply(&mut editor, &NoPhotos, Utc::now())
        .await;

        assert!(outcome.presentation.display.borderless);
        assert!(outcome.presentation.display.hide_header);
        assert!(!outcome.presentation.display.hide_pulled_at_line);
    }

    #[tokio::test]
    async fn test_apply_gradient_with_angle() {
        let mut editor = editor();

        EditCommand::Bg(BackgroundCommand::Gradient {
            a: "#111111".to_string(),
            b: "#222222".to_string(),
            angle: Some(45),
        })
        .apply(&mut editor, &NoPhotos, Utc::now())
        .await;
        let outcome = EditCommand::Bg(BackgroundCommand::Type {
            kind: BackgroundKind::Gradient,
        })
        .apply(&mut editor, &NoPhotos, Utc::now())
        .await;

        assert_eq!(
            outcome.presentation.background.image,
            "linear-gradient(45deg, #111111, #222222)"
        );
    }

    #[tokio::test]
    async fn test_apply_empty_text_command_changes_nothing() {
        let mut editor = editor();
        let before = editor.document().clone();

        let outcome = EditCommand::Text {
            title: None,
            label: None,
        }
        .apply(&mut editor, &NoPhotos, Utc::now())
        .await;

        assert_eq!(outcome.status, None);
        assert_eq!(*editor.document(), before);
    }
}
