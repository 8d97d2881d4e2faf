// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal rendering of session events.
//!
//! Results go to stdout; activity, progress and warnings go to stderr so
//! the result of a command can be piped.

use burner_core::{TrackKind, TrackRef};
use burner_engine::SessionEvent;
use std::io::{IsTerminal, Write};
use std::time::Duration;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

/// Format a byte count with a binary unit (e.g., "512 B", "4.0 MiB").
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Format a duration as "m:ss", or "h:mm:ss" past an hour.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (h, m, s) = (secs / 3600, (secs / 60) % 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// One progress line: percentage, amount written, rate and time left,
/// each part only when known.
pub fn format_progress(
    fraction: Option<f64>,
    written: u64,
    rate: Option<u64>,
    remaining: Option<Duration>,
) -> String {
    let mut parts = Vec::new();
    if let Some(fraction) = fraction {
        parts.push(format!("{:>3.0}%", (fraction * 100.0).clamp(0.0, 100.0)));
    }
    if written > 0 {
        parts.push(format_bytes(written));
    }
    if let Some(rate) = rate.filter(|r| *r > 0) {
        parts.push(format!("{}/s", format_bytes(rate)));
    }
    if let Some(remaining) = remaining {
        parts.push(format!("{} left", format_duration(remaining)));
    }
    parts.join("  ")
}

/// Text for an event, or `None` for events only shown in debug logs.
pub fn format_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::Progress { fraction, written, rate, remaining } => {
            Some(format_progress(*fraction, *written, *rate, *remaining))
        }
        SessionEvent::Action { label, .. } if label.is_empty() => None,
        SessionEvent::Action { label, .. } => Some(crate::color::header(label)),
        SessionEvent::Dangerous(true) => {
            Some(crate::color::warning("do not interrupt: the medium could be left unusable"))
        }
        SessionEvent::Dangerous(false) => None,
        SessionEvent::Warning(err) => Some(format!("{} {}", crate::color::warning("warning:"), err.message())),
        SessionEvent::TrackAdded(track) => {
            tracing::debug!(track = %describe_track(track), "track added");
            None
        }
        SessionEvent::Log { .. } => None,
    }
}

/// Short description of a track for result listings.
pub fn describe_track(track: &TrackRef) -> String {
    match track.kind() {
        TrackKind::Data(data) => format!("data track, {} graft point(s)", data.grafts.len()),
        TrackKind::Image(image) => format!("{} ({}, {} blocks)", image.image.display(), image.format, image.blocks),
        TrackKind::Stream(stream) => match stream.length() {
            Some(length) => format!("{} ({})", stream.source, format_duration(Duration::from_nanos(length))),
            None => stream.source.clone(),
        },
        TrackKind::Disc(disc) => match disc.drive() {
            Some(drive) => format!("disc in {}", drive.device_path().display()),
            None => "disc".to_string(),
        },
    }
}

/// Renders events on stderr.
///
/// On a terminal, progress redraws a single line; elsewhere progress is
/// left out so logs stay readable.
pub struct Printer {
    terminal: bool,
    progress_shown: bool,
}

impl Printer {
    pub fn new() -> Self {
        Self { terminal: std::io::stderr().is_terminal(), progress_shown: false }
    }

    pub fn show(&mut self, event: &SessionEvent) {
        let Some(text) = format_event(event) else {
            return;
        };
        let mut err = std::io::stderr().lock();
        if matches!(event, SessionEvent::Progress { .. }) {
            if self.terminal {
                let _ = write!(err, "\r\x1b[2K{text}");
                let _ = err.flush();
                self.progress_shown = true;
            }
            return;
        }
        if self.progress_shown {
            let _ = writeln!(err);
            self.progress_shown = false;
        }
        let _ = writeln!(err, "{text}");
    }

    /// End a pending progress line.
    pub fn finish(&mut self) {
        if self.progress_shown {
            let _ = writeln!(std::io::stderr());
            self.progress_shown = false;
        }
    }
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}
