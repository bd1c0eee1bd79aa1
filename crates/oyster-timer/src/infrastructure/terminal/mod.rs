//! Terminal front end: renders the presentation and the ticking timer.
//!
//! - **`commands`** – [`EditCommand`](commands::EditCommand), shared by the CLI
//!   subcommands and the interactive session, plus session line parsing.
//! - **`session`**  – The `watch` loop: tick, stdin edits, status expiry.
//!
//! [`TerminalRenderer`] writes to any [`Write`].  With ANSI enabled the timer
//! line is redrawn in place (`\r` + erase line); without it each frame is a
//! separate line, which is what tests and non-tty pipes get.

pub mod commands;
pub mod session;

use std::io::{self, Write};

use oyster_core::{BackgroundKind, DisplaySettings, Presentation};

use crate::application::status::Status;
use crate::application::tick::TickFrame;

const ERASE_LINE: &str = "\r\x1b[2K";

/// Writes presentation summaries and timer frames.
pub struct TerminalRenderer<W: Write> {
    out: W,
    ansi: bool,
    /// A frame is on screen without a trailing newline.
    frame_open: bool,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, ansi: bool) -> Self {
        Self {
            out,
            ansi,
            frame_open: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Prints the settings summary block.
    pub fn render_presentation(&mut self, p: &Presentation) -> io::Result<()> {
        self.close_frame()?;
        if !p.display.hide_header {
            writeln!(self.out, "{}", p.title)?;
        }
        writeln!(self.out, "  background  {}", describe_background(p))?;
        writeln!(
            self.out,
            "  font        {} at {}%",
            p.controls.font_family, p.scale
        )?;
        writeln!(self.out, "  style       {}, glow {}", p.controls.style_preset, p.glow)?;
        if p.display.borderless {
            writeln!(self.out, "  borderless")?;
        }
        self.out.flush()
    }

    /// Draws one timer frame; redrawn in place when ANSI is on.
    pub fn render_frame(
        &mut self,
        frame: &TickFrame,
        display: DisplaySettings,
        status: Option<Status>,
    ) -> io::Result<()> {
        let line = frame_line(frame, display, status);
        if self.ansi {
            write!(self.out, "{ERASE_LINE}{line}")?;
            self.frame_open = true;
        } else {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()
    }

    /// Prints a free-form message (help text, parse errors) on its own line.
    pub fn render_message(&mut self, message: &str) -> io::Result<()> {
        self.close_frame()?;
        writeln!(self.out, "{}", message.trim_end())?;
        self.out.flush()
    }

    /// Ends an open in-place frame with a newline.
    pub fn close_frame(&mut self) -> io::Result<()> {
        if self.frame_open {
            writeln!(self.out)?;
            self.frame_open = false;
        }
        Ok(())
    }
}

/// The text of one timer line.
pub fn frame_line(frame: &TickFrame, display: DisplaySettings, status: Option<Status>) -> String {
    let mut line = frame.timer_text.clone();
    if !display.hide_pulled_at_line {
        line.push_str("   ");
        line.push_str(&frame.pulled_at_text);
    }
    if let Some(status) = status {
        line.push_str("   · ");
        line.push_str(status.message());
    }
    line
}

/// Human summary of the background directive; photo data is not echoed.
pub fn describe_background(p: &Presentation) -> String {
    let bg = &p.background;
    match bg.kind {
        BackgroundKind::Solid => format!("solid {}", bg.base_color),
        BackgroundKind::Gradient => bg.image.clone(),
        BackgroundKind::Photo if p.controls.has_photo => {
            format!("photo ({} KiB)", bg.image.len().div_ceil(1024))
        }
        BackgroundKind::Photo => format!("photo (none stored) over {}", bg.base_color),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
