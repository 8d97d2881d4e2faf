// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracks flowing between pipeline stages.
//!
//! A track is created by the stage that produces it, shared read-only with
//! downstream stages through [`TrackRef`], and dropped with the session.
//! Only its tag store is mutable after creation.

mod data;
mod disc;
mod image;
pub mod stream;

pub use data::{DataTrack, FsFlags};
pub use disc::DiscTrack;
pub use image::{ImageFormat, ImageTrack};
pub use stream::{StreamFormat, StreamTrack};

use crate::checksum::Checksum;
use crate::medium::MediumStatus;
use crate::tags::{keys, TagValue, Tags};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared handle to a track.
pub type TrackRef = Arc<Track>;

static NEXT_TRACK_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique track identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(u64);

impl TrackId {
    fn next() -> Self {
        Self(NEXT_TRACK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "trk-{}", self.0)
    }
}

/// Variant payload of a track.
#[derive(Debug, Clone)]
pub enum TrackKind {
    Data(DataTrack),
    Image(ImageTrack),
    Stream(StreamTrack),
    Disc(DiscTrack),
}

/// Input/output type descriptor used to describe what a stage consumes
/// or produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackType {
    #[default]
    None,
    Data(FsFlags),
    Image(ImageFormat),
    Stream(StreamFormat),
    Disc(MediumStatus),
}

impl TrackType {
    /// Single-file outputs a finished stage can describe without help.
    pub fn is_single_file(&self) -> bool {
        match self {
            TrackType::Image(format) => *format == ImageFormat::Bin,
            TrackType::Stream(format) => {
                format.intersects(StreamFormat::RAW | StreamFormat::RAW_LITTLE_ENDIAN)
            }
            _ => false,
        }
    }
}

/// Size of a track on the target medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackSize {
    pub blocks: u64,
    pub bytes: u64,
}

impl std::ops::Add for TrackSize {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { blocks: self.blocks + rhs.blocks, bytes: self.bytes + rhs.bytes }
    }
}

#[derive(Debug)]
pub struct Track {
    id: TrackId,
    kind: TrackKind,
    tags: Mutex<Tags>,
}

impl Track {
    pub fn new(kind: TrackKind) -> TrackRef {
        Arc::new(Self { id: TrackId::next(), kind, tags: Mutex::new(Tags::new()) })
    }

    pub fn data(track: DataTrack) -> TrackRef {
        Self::new(TrackKind::Data(track))
    }

    pub fn image(track: ImageTrack) -> TrackRef {
        Self::new(TrackKind::Image(track))
    }

    pub fn stream(track: StreamTrack) -> TrackRef {
        Self::new(TrackKind::Stream(track))
    }

    pub fn disc(track: DiscTrack) -> TrackRef {
        Self::new(TrackKind::Disc(track))
    }

    /// A new track of a different kind that inherits this track's tags.
    pub fn derive(&self, kind: TrackKind) -> TrackRef {
        let tags = self.tags.lock().clone();
        Arc::new(Self { id: TrackId::next(), kind, tags: Mutex::new(tags) })
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn kind(&self) -> &TrackKind {
        &self.kind
    }

    pub fn as_data(&self) -> Option<&DataTrack> {
        match &self.kind {
            TrackKind::Data(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageTrack> {
        match &self.kind {
            TrackKind::Image(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&StreamTrack> {
        match &self.kind {
            TrackKind::Stream(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_disc(&self) -> Option<&DiscTrack> {
        match &self.kind {
            TrackKind::Disc(t) => Some(t),
            _ => None,
        }
    }

    pub fn track_type(&self) -> TrackType {
        match &self.kind {
            TrackKind::Data(t) => TrackType::Data(t.fs),
            TrackKind::Image(t) => TrackType::Image(t.format),
            TrackKind::Stream(t) => TrackType::Stream(t.format),
            TrackKind::Disc(t) => TrackType::Disc(
                t.drive().and_then(|d| d.medium()).map(|m| m.status).unwrap_or_default(),
            ),
        }
    }

    /// Size on the target medium, or `None` when it is not known yet.
    pub fn size(&self) -> Option<TrackSize> {
        match &self.kind {
            TrackKind::Data(t) => {
                (t.blocks > 0).then_some(TrackSize { blocks: t.blocks, bytes: t.blocks * 2048 })
            }
            TrackKind::Image(t) => (t.blocks > 0).then_some(TrackSize {
                blocks: t.blocks,
                bytes: t.blocks * t.format.block_size(),
            }),
            TrackKind::Stream(t) => {
                let length = t.length()? + t.gap;
                Some(TrackSize {
                    blocks: stream::duration_to_sectors(length),
                    bytes: stream::duration_to_bytes(length),
                })
            }
            TrackKind::Disc(t) => {
                let medium = t.drive()?.medium()?;
                let blocks = medium.data_blocks(t.session);
                Some(TrackSize { blocks, bytes: blocks * 2048 })
            }
        }
    }

    pub fn tag(&self, key: &str) -> Option<TagValue> {
        self.tags.lock().get(key).cloned()
    }

    pub fn set_tag(&self, key: impl Into<String>, value: impl Into<TagValue>) {
        self.tags.lock().set(key, value);
    }

    /// Snapshot of every tag.
    pub fn tags(&self) -> Tags {
        self.tags.lock().clone()
    }

    pub fn checksum(&self) -> Option<Checksum> {
        self.tags.lock().get_checksum(keys::TRACK_CHECKSUM).cloned()
    }

    /// Attach a checksum, replacing any previous one.
    pub fn set_checksum(&self, checksum: Checksum) {
        self.tags.lock().set(keys::TRACK_CHECKSUM, checksum);
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
