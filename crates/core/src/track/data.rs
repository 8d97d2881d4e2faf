// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data track: a set of graft points to be laid out as a filesystem.

use crate::graft::GraftPoint;

crate::flags! {
    /// Filesystem features requested for a data image.
    pub struct FsFlags: u32 {
        const ISO = 1 << 0;
        const UNDEFINED = 1 << 1;
        const ISO_LEVEL3 = 1 << 2;
        const JOLIET = 1 << 3;
        const UDF = 1 << 4;
        const VIDEO = 1 << 5;
        const DEEP_DIRECTORY = 1 << 6;
        const SYMLINK = 1 << 7;
        const HIDDEN = 1 << 8;
        const APPENDABLE = 1 << 9;
    }
}

/// Files to lay out in a new filesystem.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTrack {
    pub grafts: Vec<GraftPoint>,
    /// Source URIs skipped while walking grafted directories
    pub excluded: Vec<String>,
    pub fs: FsFlags,
    pub file_count: u64,
    /// Size of the future image in 2048-byte blocks, when known
    pub blocks: u64,
}

impl DataTrack {
    pub fn new(grafts: Vec<GraftPoint>) -> Self {
        Self { grafts, fs: FsFlags::ISO, ..Default::default() }
    }

    crate::setters! {
        set { fs: FsFlags, file_count: u64, blocks: u64 }
    }

    pub fn excluded(mut self, uris: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded = uris.into_iter().map(Into::into).collect();
        self
    }

    /// True when every graft source can be read with plain file I/O.
    pub fn is_local(&self) -> bool {
        self.grafts.iter().all(GraftPoint::is_local)
    }

    pub fn is_excluded(&self, uri: &str) -> bool {
        self.excluded.iter().any(|e| e == uri)
    }
}
