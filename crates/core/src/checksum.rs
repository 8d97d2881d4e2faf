// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checksum algorithms and results attached to tracks.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Digest algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumType {
    None,
    #[default]
    Md5,
    Sha1,
    Sha256,
}

impl ChecksumType {
    /// Length of the lowercase hex digest.
    pub fn hex_len(self) -> usize {
        match self {
            ChecksumType::None => 0,
            ChecksumType::Md5 => 32,
            ChecksumType::Sha1 => 40,
            ChecksumType::Sha256 => 64,
        }
    }

    /// Name of the manifest file grafted at the root of a data image.
    pub fn manifest_name(self) -> Option<&'static str> {
        match self {
            ChecksumType::None => None,
            ChecksumType::Md5 => Some(".checksum.md5"),
            ChecksumType::Sha1 => Some(".checksum.sha1"),
            ChecksumType::Sha256 => Some(".checksum.sha256"),
        }
    }
}

crate::simple_display! {
    ChecksumType {
        None => "none",
        Md5 => "md5",
        Sha1 => "sha1",
        Sha256 => "sha256",
    }
}

impl FromStr for ChecksumType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(ChecksumType::None),
            "md5" => Ok(ChecksumType::Md5),
            "sha1" => Ok(ChecksumType::Sha1),
            "sha256" => Ok(ChecksumType::Sha256),
            other => Err(format!("unknown checksum type: {other}")),
        }
    }
}

/// A digest value with its algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    kind: ChecksumType,
    value: String,
}

impl Checksum {
    /// Build a checksum from a hex digest. The value is lowercased; `None` is
    /// returned when its length or alphabet does not fit the algorithm.
    pub fn new(kind: ChecksumType, value: impl AsRef<str>) -> Option<Self> {
        let value = value.as_ref().trim().to_ascii_lowercase();
        if kind == ChecksumType::None
            || value.len() != kind.hex_len()
            || !value.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return None;
        }
        Some(Self { kind, value })
    }

    pub fn kind(&self) -> ChecksumType {
        self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Guess the algorithm from the digest length.
    pub fn detect(value: &str) -> Option<Self> {
        let kind = match value.trim().len() {
            32 => ChecksumType::Md5,
            40 => ChecksumType::Sha1,
            64 => ChecksumType::Sha256,
            _ => return None,
        };
        Self::new(kind, value)
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

#[cfg(test)]
#[path = "checksum_tests.rs"]
mod tests;
