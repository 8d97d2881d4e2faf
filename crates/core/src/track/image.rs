// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Image track: a disc image file, optionally with a TOC/cue sidecar.

use std::path::PathBuf;

/// On-disk layout of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageFormat {
    #[default]
    None,
    /// Plain 2048-byte sector image (ISO)
    Bin,
    /// Raw image described by a cue sheet
    Cue,
    /// readcd clone image with a .toc file
    Clone,
    /// cdrdao TOC file
    Cdrdao,
}

impl ImageFormat {
    /// Bytes per block stored in the image file.
    pub fn block_size(self) -> u64 {
        match self {
            ImageFormat::Bin | ImageFormat::None => 2048,
            ImageFormat::Cue | ImageFormat::Clone | ImageFormat::Cdrdao => 2352,
        }
    }

    pub fn needs_toc(self) -> bool {
        matches!(self, ImageFormat::Cue | ImageFormat::Clone | ImageFormat::Cdrdao)
    }
}

crate::simple_display! {
    ImageFormat {
        None => "none",
        Bin => "bin",
        Cue => "cue",
        Clone => "clone",
        Cdrdao => "cdrdao",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTrack {
    pub image: PathBuf,
    pub toc: Option<PathBuf>,
    pub format: ImageFormat,
    pub blocks: u64,
}

impl ImageTrack {
    pub fn new(image: impl Into<PathBuf>, format: ImageFormat) -> Self {
        Self { image: image.into(), toc: None, format, blocks: 0 }
    }

    crate::setters! {
        set { blocks: u64 }
        option { toc: PathBuf }
    }

    /// Derive the block count from the image file length.
    pub fn with_blocks_from_len(mut self, len: u64) -> Self {
        self.blocks = len.div_ceil(self.format.block_size());
        self
    }
}
