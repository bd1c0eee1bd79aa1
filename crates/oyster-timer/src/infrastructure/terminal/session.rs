//! The interactive `watch` session.
//!
//! One cooperative loop, no background tasks:
//!
//! ```text
//! ┌─ ticker.tick() ──▶ reload document → recompute frame → redraw
//! │
//! ├─ input line ─────▶ parse → apply edit → summary + redraw with status
//! │
//! └─ running == false or `quit` ──▶ close the frame line and return
//! ```
//!
//! Each tick re-reads the stored slot so edits made by another
//! `oyster-timer` invocation appear within one tick; the document is only
//! parsed again when the slot text changed.  Frames are recomputed
//! from the wall clock, so a late tick never drifts the display.

use std::fmt::Display;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::commands::{parse_session_line, SessionCommand};
use super::TerminalRenderer;
use crate::application::edit_settings::{PhotoIngestor, SettingsEditor};
use crate::application::settings_store::KeyValueStore;
use crate::application::status::{Status, StatusLine, DEFAULT_STATUS_TTL};

/// Timing knobs for [`run_session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub tick_interval: Duration,
    pub status_ttl: Duration,
    /// Re-read the stored document on every tick.
    pub follow_storage: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            status_ttl: DEFAULT_STATUS_TTL,
            follow_storage: true,
        }
    }
}

/// Why [`run_session`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user typed `quit`.
    Quit,
    /// The shared `running` flag was cleared (Ctrl+C).
    Interrupted,
}

/// Runs the live display until `quit` or until `running` is cleared.
///
/// `input` supplies edit lines; `None` (or end of input) leaves a
/// display-only session.
///
/// # Errors
///
/// Returns an I/O error if writing to the terminal fails.
pub async fn run_session<S, Tz, R, W>(
    editor: &mut SettingsEditor<S, Tz>,
    ingestor: &dyn PhotoIngestor,
    renderer: &mut TerminalRenderer<W>,
    input: Option<R>,
    options: SessionOptions,
    running: Arc<AtomicBool>,
) -> std::io::Result<SessionEnd>
where
    S: KeyValueStore,
    Tz: TimeZone,
    Tz::Offset: Display,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut ticker = interval(options.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut status = StatusLine::new(options.status_ttl);
    let mut lines = input.map(|r| r.lines());

    info!("watch session started (tick {:?})", options.tick_interval);
    renderer.render_presentation(&editor.presentation())?;

    let end = loop {
        if !running.load(Ordering::Relaxed) {
            break SessionEnd::Interrupted;
        }

        tokio::select! {
            _ = ticker.tick() => {
                if options.follow_storage {
                    editor.reload();
                }
                draw(editor, renderer, &mut status)?;
            }
            line = next_line(&mut lines) => match line {
                Ok(Some(text)) => {
                    if handle_line(&text, editor, ingestor, renderer, &mut status).await? {
                        break SessionEnd::Quit;
                    }
                }
                Ok(None) => {
                    debug!("input closed; continuing display-only");
                    lines = None;
                }
                Err(e) => {
                    warn!("stopped reading input: {e}");
                    lines = None;
                }
            },
        }
    };

    renderer.close_frame()?;
    info!("watch session ended: {end:?}");
    Ok(end)
}

/// Applies one input line; returns `true` when the session should end.
async fn handle_line<S, Tz, W>(
    text: &str,
    editor: &mut SettingsEditor<S, Tz>,
    ingestor: &dyn PhotoIngestor,
    renderer: &mut TerminalRenderer<W>,
    status: &mut StatusLine,
) -> std::io::Result<bool>
where
    S: KeyValueStore,
    Tz: TimeZone,
    Tz::Offset: Display,
    W: Write,
{
    match parse_session_line(text) {
        Ok(None) => {}
        Ok(Some(SessionCommand::Quit)) => return Ok(true),
        Ok(Some(SessionCommand::Show)) => {
            renderer.render_presentation(&editor.presentation())?;
            draw(editor, renderer, status)?;
        }
        Ok(Some(SessionCommand::Edit(command))) => {
            debug!("applying {command:?}");
            let outcome = command.apply(editor, ingestor, Utc::now()).await;
            if let Some(s) = outcome.status {
                show_status(status, s);
            }
            renderer.render_presentation(&outcome.presentation)?;
            draw(editor, renderer, status)?;
        }
        Err(e) => renderer.render_message(&e.to_string())?,
    }
    Ok(false)
}

fn show_status(line: &mut StatusLine, status: Status) {
    if status.is_error() {
        warn!("{status}");
    }
    line.set(status, Instant::now());
}

fn draw<S, Tz, W>(
    editor: &SettingsEditor<S, Tz>,
    renderer: &mut TerminalRenderer<W>,
    status: &mut StatusLine,
) -> std::io::Result<()>
where
    S: KeyValueStore,
    Tz: TimeZone,
    Tz::Offset: Display,
    W: Write,
{
    let frame = editor.tick(Utc::now());
    renderer.render_frame(&frame, editor.document().display, status.visible(Instant::now()))
}

async fn next_line<R>(lines: &mut Option<Lines<R>>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    match lines {
        Some(lines) => lines.next_line().await,
        None => std::future::pending().await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
