// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-owned temporary files and directories.
//!
//! Everything lives under one root directory created lazily in the
//! configured parent; dropping the store removes the whole tree no matter
//! which job allocated what.

use burner_core::{BurnerError, ErrorKind};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TempStore {
    parent: PathBuf,
    root: Option<TempDir>,
    counter: u32,
}

impl TempStore {
    pub fn new(parent: impl Into<PathBuf>) -> Self {
        Self { parent: parent.into(), root: None, counter: 0 }
    }

    /// Root directory, if anything was allocated yet.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_ref().map(TempDir::path)
    }

    fn ensure_root(&mut self) -> Result<PathBuf, BurnerError> {
        if let Some(root) = &self.root {
            return Ok(root.path().to_path_buf());
        }
        let root = tempfile::Builder::new()
            .prefix("burner-")
            .tempdir_in(&self.parent)
            .map_err(|e| {
                BurnerError::new(
                    ErrorKind::TmpDirectory,
                    format!("cannot create a temporary directory in {}: {e}", self.parent.display()),
                )
            })?;
        let path = root.path().to_path_buf();
        tracing::debug!(root = %path.display(), "created session temp directory");
        self.root = Some(root);
        Ok(path)
    }

    fn next_name(&mut self, stem: &str, suffix: &str) -> String {
        self.counter += 1;
        format!("{stem}{:04}{suffix}", self.counter)
    }

    /// Reserve a new empty file. The caller (or the tool it drives) may
    /// overwrite or replace it.
    pub fn file(&mut self, suffix: Option<&str>) -> Result<PathBuf, BurnerError> {
        let root = self.ensure_root()?;
        let name = self.next_name("file", suffix.unwrap_or(""));
        let path = root.join(name);
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| BurnerError::io(format!("cannot create {}", path.display()), &e))?;
        Ok(path)
    }

    pub fn dir(&mut self) -> Result<PathBuf, BurnerError> {
        let root = self.ensure_root()?;
        let name = self.next_name("dir", "");
        let path = root.join(name);
        fs::create_dir(&path)
            .map_err(|e| BurnerError::io(format!("cannot create {}", path.display()), &e))?;
        Ok(path)
    }

    /// Remove everything allocated so far.
    pub fn cleanup(&mut self) {
        if let Some(root) = self.root.take() {
            let path = root.path().to_path_buf();
            if let Err(e) = root.close() {
                tracing::warn!(root = %path.display(), error = %e, "failed to remove temp directory");
            }
        }
    }
}

impl Drop for TempStore {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
#[path = "temp_tests.rs"]
mod tests;
