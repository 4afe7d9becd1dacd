// src/display/terminal.rs
//! Terminal progress display for captures

use super::CaptureObserver;
use crate::{
    capture::CaptureStats,
    error::{NmeaError, Result},
    nmea::Sentence,
};
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, Write};

/// Prints `.` per background sentence and `+` per retained one.
///
/// This is the operator's confirmation that the chartplotter is sending;
/// the device never signals the end of a transfer, so the operator stops
/// the capture with Ctrl+C once the `+` marks stop.
pub struct TerminalProgress<W: Write = io::Stderr> {
    out: W,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self { out: io::stderr() }
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> TerminalProgress<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn mark(&mut self, color: Color, mark: &str) {
        let written = execute!(self.out, SetForegroundColor(color), Print(mark), ResetColor);
        if let Err(e) = written {
            log::debug!("Progress output failed: {}", e);
        }
    }

    fn render_summary(&mut self, stats: &CaptureStats) -> io::Result<()> {
        execute!(
            self.out,
            Print("\n"),
            SetForegroundColor(Color::Green),
            Print("=".repeat(40)),
            Print("\nCAPTURE SUMMARY\n"),
            Print("=".repeat(40)),
            Print("\n"),
            ResetColor
        )?;

        execute!(
            self.out,
            Print(format!("  Retained:  {:>8}\n", stats.retained)),
            Print(format!("  Ignored:   {:>8}\n", stats.ignored)),
            Print(format!("  Undecoded: {:>8}\n", stats.decode_errors)),
            Print(format!("  Bad frames:{:>8}\n", stats.scan.checksum_errors + stats.scan.malformed))
        )?;

        if !stats.by_type.is_empty() {
            execute!(
                self.out,
                SetForegroundColor(Color::Yellow),
                Print("SENTENCES:\n"),
                ResetColor
            )?;
            for (header, count) in &stats.by_type {
                execute!(self.out, Print(format!("  {:<10}{:>8}\n", header, count)))?;
            }
        }
        self.out.flush()
    }
}

impl<W: Write> CaptureObserver for TerminalProgress<W> {
    fn ignored(&mut self, _sentence: &Sentence) {
        self.mark(Color::DarkGrey, ".");
    }

    fn retained(&mut self, _sentence: &Sentence) {
        self.mark(Color::Green, "+");
    }

    fn dropped(&mut self, _fields: &[String], _error: &NmeaError) {
        self.mark(Color::Red, "x");
    }

    fn finish(&mut self, stats: &CaptureStats) -> Result<()> {
        self.render_summary(stats).map_err(|e| NmeaError::Io(e))
    }
}
