// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Contract with the drive/medium layer.
//!
//! The engine never opens device handles itself; it only reads what the
//! drive layer reports through [`Drive`].

use std::path::{Path, PathBuf};

crate::flags! {
    /// Medium type and state bits as reported by the drive layer.
    pub struct MediumStatus: u32 {
        const FILE = 1 << 0;
        const CD = 1 << 1;
        const DVD = 1 << 2;
        const BD = 1 << 3;
        const ROM = 1 << 4;
        const WRITABLE = 1 << 5;
        const REWRITABLE = 1 << 6;
        const BLANK = 1 << 7;
        const APPENDABLE = 1 << 8;
        const CLOSED = 1 << 9;
        const HAS_DATA = 1 << 10;
        const HAS_AUDIO = 1 << 11;
        const PROTECTED = 1 << 12;
        const BUSY = 1 << 13;
    }
}

/// Disc family, used to derive the "x" speed factor from a byte rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediumFamily {
    Cd,
    Dvd,
    Bd,
}

impl MediumFamily {
    /// Bytes per second of a 1x drive for this family.
    pub fn base_rate(self) -> u64 {
        match self {
            MediumFamily::Cd => 176_400,
            MediumFamily::Dvd => 1_385_000,
            MediumFamily::Bd => 4_500_000,
        }
    }

    pub fn from_status(status: MediumStatus) -> Option<Self> {
        if status.contains(MediumStatus::BD) {
            Some(MediumFamily::Bd)
        } else if status.contains(MediumStatus::DVD) {
            Some(MediumFamily::Dvd)
        } else if status.contains(MediumStatus::CD) {
            Some(MediumFamily::Cd)
        } else {
            None
        }
    }
}

/// One track of the inserted medium.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediumTrack {
    pub session: u32,
    pub number: u32,
    /// Start address in blocks
    pub address: u64,
    pub blocks: u64,
}

/// Snapshot of the inserted medium.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediumInfo {
    pub status: MediumStatus,
    pub capacity_blocks: u64,
    pub last_session_address: Option<u64>,
    pub next_writable_address: Option<u64>,
    pub tracks: Vec<MediumTrack>,
}

impl MediumInfo {
    pub fn track(&self, number: u32) -> Option<&MediumTrack> {
        self.tracks.iter().find(|t| t.number == number)
    }

    /// Blocks of data held by `session`, or by the whole medium when `None`.
    pub fn data_blocks(&self, session: Option<u32>) -> u64 {
        self.tracks
            .iter()
            .filter(|t| session.is_none_or(|s| t.session == s))
            .map(|t| t.blocks)
            .sum()
    }
}

/// A recorder or reader as seen by the engine.
pub trait Drive: Send + Sync {
    /// Device node, e.g. `/dev/sr0`
    fn device_path(&self) -> &Path;

    /// SCSI `bus,target,lun` address when the drive layer knows it
    fn bus_target_lun(&self) -> Option<String> {
        None
    }

    /// Current medium, or `None` when the tray is empty
    fn medium(&self) -> Option<MediumInfo>;

    /// Fastest write rate for the current medium, bytes per second
    fn max_rate(&self) -> Option<u64> {
        None
    }
}

/// A drive whose medium never changes; used for image targets and tests.
#[derive(Debug, Clone)]
pub struct StaticDrive {
    device: PathBuf,
    bus_target_lun: Option<String>,
    medium: Option<MediumInfo>,
    max_rate: Option<u64>,
}

impl StaticDrive {
    pub fn new(device: impl Into<PathBuf>, medium: Option<MediumInfo>) -> Self {
        Self { device: device.into(), bus_target_lun: None, medium, max_rate: None }
    }

    pub fn with_bus_target_lun(mut self, btl: impl Into<String>) -> Self {
        self.bus_target_lun = Some(btl.into());
        self
    }

    pub fn with_max_rate(mut self, rate: u64) -> Self {
        self.max_rate = Some(rate);
        self
    }
}

impl Drive for StaticDrive {
    fn device_path(&self) -> &Path {
        &self.device
    }

    fn bus_target_lun(&self) -> Option<String> {
        self.bus_target_lun.clone()
    }

    fn medium(&self) -> Option<MediumInfo> {
        self.medium.clone()
    }

    fn max_rate(&self) -> Option<u64> {
        self.max_rate
    }
}
