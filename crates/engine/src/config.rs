// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration, loaded from TOML.
//!
//! ```toml
//! tmp_dir = "/var/tmp"
//! tick_interval_ms = 500
//! checksum = "sha256"
//! session_log = "/var/log/burner/session.log"
//! speed = 8
//!
//! [tools]
//! wodim = "/opt/cdrkit/bin/wodim"
//!
//! [mirrors]
//! "http://archive.example.org/iso/" = "/srv/mirror/iso"
//! ```

use crate::env;
use burner_core::ChecksumType;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_TICK_MS: u64 = 500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid config {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Parent of the per-session temp directory
    pub tmp_dir: PathBuf,
    pub tick_interval_ms: u64,
    /// Digest used by the checksum jobs when none is imposed
    pub checksum: ChecksumType,
    pub session_log: Option<PathBuf>,
    /// Requested write speed, as a multiple of the medium base rate
    pub speed: Option<u32>,
    /// Program name to executable overrides
    pub tools: BTreeMap<String, PathBuf>,
    /// URI prefix to local directory
    pub mirrors: BTreeMap<String, PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tmp_dir: std::env::temp_dir(),
            tick_interval_ms: DEFAULT_TICK_MS,
            checksum: ChecksumType::Md5,
            session_log: None,
            speed: None,
            tools: BTreeMap::new(),
            mirrors: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Load `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(path, &text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io { path: path.to_path_buf(), source }),
        }
    }

    /// Load from the default location, then apply environment overrides.
    pub fn load_default() -> Result<Self, ConfigError> {
        let config = match env::config_path() {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(dir) = env::tmp_dir() {
            self.tmp_dir = dir;
        }
        if let Some(tick) = env::tick_interval() {
            self.tick_interval_ms = tick.as_millis() as u64;
        }
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Executable to run for `program`.
    pub fn tool(&self, program: &str) -> PathBuf {
        self.tools.get(program).cloned().unwrap_or_else(|| PathBuf::from(program))
    }

    /// Local path standing in for `uri`, from the longest matching mirror
    /// prefix. The decoded remainder must stay inside the mirror directory.
    pub fn mirror_for(&self, uri: &str) -> Option<PathBuf> {
        let (prefix, dir) = self
            .mirrors
            .iter()
            .filter(|(prefix, _)| uri.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())?;
        let rest = burner_core::uri::decode(uri[prefix.len()..].trim_start_matches('/'));
        if rest.is_empty() {
            return Some(dir.clone());
        }
        let rest = Path::new(&rest);
        if !rest.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir)) {
            tracing::warn!(%uri, mirror = %dir.display(), "mirror path escapes its directory");
            return None;
        }
        Some(dir.join(rest))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
