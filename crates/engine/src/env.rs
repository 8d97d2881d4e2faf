// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate.

use std::path::PathBuf;
use std::time::Duration;

/// Resolve the config file: BURNER_CONFIG > <config_dir>/burner/config.toml
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("BURNER_CONFIG").filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("burner").join("config.toml"))
}

/// Parent directory for session temp files
pub fn tmp_dir() -> Option<PathBuf> {
    std::env::var_os("BURNER_TMPDIR").filter(|p| !p.is_empty()).map(PathBuf::from)
}

/// Loop tick interval override
pub fn tick_interval() -> Option<Duration> {
    std::env::var("BURNER_TICK_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
