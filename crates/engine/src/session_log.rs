// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only session log.

use chrono::{SecondsFormat, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes human-readable timestamped lines to one file per session.
///
/// Each `append()` call opens, writes, and closes the file. Tool output
/// is the busiest writer and stays well within what that costs.
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a line for `job`.
    ///
    /// Format: `2026-01-30T08:14:09Z [job] message`
    ///
    /// Failures are logged via tracing but do not propagate.
    pub fn append(&self, job: &str, message: &str) {
        if let Err(e) = self.write_line(job, message) {
            tracing::warn!(job, path = %self.path.display(), error = %e, "failed to write session log");
        }
    }

    fn write_line(&self, job: &str, message: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        writeln!(file, "{} [{}] {}", ts, job, message.trim_end())?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_log_tests.rs"]
mod tests;
