// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `burner burn` and `burner blank`: recording with wodim.

use super::session::run_tasks;
use crate::exit_error::{codes, ExitError};
use anyhow::Result;
use burner_core::{
    uri, Action, BurnFlags, Checksum, Drive, ImageFormat, ImageTrack, MediumInfo, MediumStatus, StaticDrive,
    StreamFormat, StreamTrack, Track, TrackRef,
};
use burner_engine::{EngineConfig, JobContext, Session, Task};
use burner_plugins::{ChecksumImage, Wodim};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Medium {
    #[default]
    Cd,
    Dvd,
    Bd,
}

impl Medium {
    fn status(self) -> MediumStatus {
        let family = match self {
            Medium::Cd => MediumStatus::CD,
            Medium::Dvd => MediumStatus::DVD,
            Medium::Bd => MediumStatus::BD,
        };
        family | MediumStatus::WRITABLE
    }
}

/// The recorder and the disc in it.
#[derive(Args, Debug)]
pub struct DriveArgs {
    /// Recorder device node, e.g. /dev/sr0
    #[arg(long, value_name = "DEV")]
    pub device: PathBuf,

    /// SCSI bus,target,lun address, preferred over the device node
    #[arg(long, value_name = "B,T,L")]
    pub btl: Option<String>,

    /// Kind of disc in the drive; sets the unit of --speed
    #[arg(long, value_enum, default_value_t = Medium::Cd)]
    pub medium: Medium,

    /// Simulate: the laser stays off
    #[arg(long)]
    pub dummy: bool,

    /// Eject the disc when done
    #[arg(long)]
    pub eject: bool,
}

impl DriveArgs {
    fn drive(&self, rewritable: bool) -> Arc<dyn Drive> {
        let mut status = self.medium.status();
        if rewritable {
            status |= MediumStatus::REWRITABLE;
        }
        let medium = MediumInfo { status, ..MediumInfo::default() };
        let mut drive = StaticDrive::new(&self.device, Some(medium));
        if let Some(btl) = &self.btl {
            drive = drive.with_bus_target_lun(btl.clone());
        }
        Arc::new(drive)
    }

    fn flags(&self) -> BurnFlags {
        let mut flags = BurnFlags::empty();
        if self.dummy {
            flags |= BurnFlags::DUMMY;
        }
        if self.eject {
            flags |= BurnFlags::EJECT;
        }
        flags
    }
}

#[derive(Args, Debug)]
pub struct BurnArgs {
    #[command(flatten)]
    pub drive: DriveArgs,

    /// Data image to record
    pub image: Option<PathBuf>,

    /// Big-endian raw audio file from `burner audio` (repeatable)
    #[arg(long = "audio", value_name = "FILE")]
    pub audio: Vec<PathBuf>,

    /// Write speed as a multiple of the medium base rate (default: fastest)
    #[arg(long)]
    pub speed: Option<u32>,

    /// Disc-at-once; falls back to track-at-once if the drive refuses
    #[arg(long)]
    pub dao: bool,

    /// Leave the disc open for more sessions
    #[arg(long)]
    pub multi: bool,

    /// Buffer underrun protection
    #[arg(long)]
    pub burnproof: bool,

    /// Checksum the image before recording and print it
    #[arg(long)]
    pub checksum: bool,
}

impl BurnArgs {
    pub fn tracks(&self) -> Result<Vec<TrackRef>, ExitError> {
        let mut tracks = Vec::new();
        if let Some(image) = &self.image {
            let len = std::fs::metadata(image)
                .map_err(|e| ExitError::new(codes::FAILURE, format!("cannot read {}: {e}", image.display())))?
                .len();
            tracks.push(Track::image(ImageTrack::new(image, ImageFormat::Bin).with_blocks_from_len(len)));
        }
        for file in &self.audio {
            let path = std::path::absolute(file).unwrap_or_else(|_| file.clone());
            tracks.push(Track::stream(StreamTrack::new(uri::from_path(&path), StreamFormat::RAW)));
        }
        if tracks.is_empty() {
            return Err(ExitError::new(codes::UNAVAILABLE, "nothing to burn: give an image or --audio files"));
        }
        Ok(tracks)
    }

    pub fn flags(&self) -> BurnFlags {
        let mut flags = self.drive.flags();
        for (set, flag) in [(self.dao, BurnFlags::DAO), (self.multi, BurnFlags::MULTI), (self.burnproof, BurnFlags::BURNPROOF)] {
            if set {
                flags |= flag;
            }
        }
        flags
    }
}

#[derive(Args, Debug)]
pub struct BlankArgs {
    #[command(flatten)]
    pub drive: DriveArgs,

    /// Only blank the table of contents
    #[arg(long)]
    pub fast: bool,
}

/// Record the tracks; returns the checksums computed on the way.
pub async fn run_burn(args: &BurnArgs, mut config: EngineConfig) -> Result<Vec<Checksum>, ExitError> {
    if args.speed.is_some() {
        config.speed = args.speed;
    }
    let tracks = args.tracks()?;
    let ctx = JobContext::new(Arc::new(config))
        .with_tracks(tracks.clone())
        .with_target(args.drive.drive(false))
        .with_flags(args.flags());
    let mut session = Session::new(ctx);

    let mut tasks = Vec::new();
    if args.checksum {
        tasks.push(Task::new(Action::Record).job(ChecksumImage::new()));
    }
    tasks.push(Task::new(Action::Record).job(Wodim::job()));
    run_tasks(&mut session, tasks).await?;

    Ok(tracks.iter().filter_map(|t| t.checksum()).collect())
}

pub async fn run_blank(args: &BlankArgs, config: EngineConfig) -> Result<(), ExitError> {
    let mut flags = args.drive.flags();
    if args.fast {
        flags |= BurnFlags::FAST_BLANK;
    }
    let ctx = JobContext::new(Arc::new(config)).with_target(args.drive.drive(true)).with_flags(flags);
    let mut session = Session::new(ctx);
    run_tasks(&mut session, vec![Task::new(Action::Erase).job(Wodim::job())]).await
}

pub async fn handle_burn(args: BurnArgs, config: EngineConfig) -> Result<()> {
    for checksum in run_burn(&args, config).await? {
        println!("{checksum}");
    }
    Ok(())
}

pub async fn handle_blank(args: BlankArgs, config: EngineConfig) -> Result<()> {
    run_blank(&args, config).await?;
    Ok(())
}

#[cfg(test)]
#[path = "burn_tests.rs"]
mod tests;
