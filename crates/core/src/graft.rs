// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Placement of a source file inside a to-be-built filesystem.

/// Maps a source `uri` to a destination `path` inside the image.
///
/// A `None` uri creates an empty directory at `path`. Non-local uris must
/// be materialised by the local-track stage before an image stage reads them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraftPoint {
    pub uri: Option<String>,
    pub path: String,
}

impl GraftPoint {
    pub fn new(uri: impl Into<String>, path: impl Into<String>) -> Self {
        Self { uri: Some(uri.into()), path: path.into() }
    }

    /// Graft point for an empty directory.
    pub fn directory(path: impl Into<String>) -> Self {
        Self { uri: None, path: path.into() }
    }

    pub fn is_directory(&self) -> bool {
        self.uri.is_none()
    }

    /// True when the source is readable with plain file I/O.
    pub fn is_local(&self) -> bool {
        self.uri.as_deref().is_none_or(crate::uri::is_local)
    }

    /// If `image_path` lies at or under this graft's destination, return the
    /// local source path that provides it.
    pub fn source_for(&self, image_path: &str) -> Option<std::path::PathBuf> {
        let base = crate::uri::to_path(self.uri.as_deref()?)?;
        let dest = self.path.trim_end_matches('/');
        if image_path == dest {
            return Some(base);
        }
        let rest = image_path.strip_prefix(dest)?.strip_prefix('/')?;
        Some(base.join(rest))
    }
}

#[cfg(test)]
#[path = "graft_tests.rs"]
mod tests;
