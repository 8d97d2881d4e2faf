// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream track: an audio or video source with time boundaries.

/// CD audio frames per second (sectors)
pub const SECTORS_PER_SECOND: u64 = 75;
/// Bytes in one raw audio sector
pub const AUDIO_SECTOR_SIZE: u64 = 2352;
/// Bytes per second of 44.1 kHz, 16-bit, stereo PCM
pub const CD_AUDIO_BYTE_RATE: u64 = SECTORS_PER_SECOND * AUDIO_SECTOR_SIZE;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

crate::flags! {
    /// Stream encoding bits.
    pub struct StreamFormat: u32 {
        const UNDEFINED = 1 << 0;
        /// Big-endian raw CD audio
        const RAW = 1 << 1;
        const RAW_LITTLE_ENDIAN = 1 << 2;
        const DTS = 1 << 3;
        const AC3 = 1 << 4;
        const MP2 = 1 << 5;
        const FOUR_CHANNEL = 1 << 6;
        const VIDEO_UNDEFINED = 1 << 7;
        const VCD = 1 << 8;
        const SVCD = 1 << 9;
        const VIDEO_DVD = 1 << 10;
        const METADATA_INFO = 1 << 11;
    }
}

/// Convert a duration in nanoseconds to raw CD-audio bytes.
pub fn duration_to_bytes(nanos: u64) -> u64 {
    (nanos as u128 * CD_AUDIO_BYTE_RATE as u128 / NANOS_PER_SECOND) as u64
}

/// Convert a duration in nanoseconds to CD sectors.
pub fn duration_to_sectors(nanos: u64) -> u64 {
    (nanos as u128 * SECTORS_PER_SECOND as u128 / NANOS_PER_SECOND) as u64
}

/// Convert raw CD-audio bytes to a duration in nanoseconds.
pub fn bytes_to_duration(bytes: u64) -> u64 {
    (bytes as u128 * NANOS_PER_SECOND / CD_AUDIO_BYTE_RATE as u128) as u64
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTrack {
    pub source: String,
    pub format: StreamFormat,
    /// Start offset into the source, nanoseconds
    pub start: u64,
    /// End offset into the source, nanoseconds; `None` until known
    pub end: Option<u64>,
    /// Silence to insert after the track, nanoseconds
    pub gap: u64,
}

impl StreamTrack {
    pub fn new(source: impl Into<String>, format: StreamFormat) -> Self {
        Self { source: source.into(), format, start: 0, end: None, gap: 0 }
    }

    crate::setters! {
        set { start: u64, gap: u64 }
        option { end: u64 }
    }

    /// Playing length without the gap.
    pub fn length(&self) -> Option<u64> {
        self.end.map(|end| end.saturating_sub(self.start))
    }

    /// Same source and same boundaries: the output of one can stand in for
    /// the other.
    pub fn is_sibling(&self, other: &StreamTrack) -> bool {
        self.source == other.source && self.start == other.start && self.end == other.end
    }
}
