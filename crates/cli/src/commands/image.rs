// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `burner image` and `burner size`: ISO9660 images from graft points.

use super::session::run_tasks;
use crate::args::{parse_graft, source_uri};
use crate::exit_error::{codes, ExitError};
use anyhow::Result;
use burner_core::tags::keys;
use burner_core::{Action, DataTrack, FsFlags, GraftPoint, ImageFormat, Track, TrackRef, TrackSize, TrackType};
use burner_engine::{EngineConfig, JobContext, Session, Task, TaskOutput};
use burner_plugins::{ChecksumFiles, Genisoimage, LocalTrack};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// What goes into the filesystem and how it is laid out.
#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// SRC=DEST graft point (repeatable); SRC alone lands at the root, =DEST
    /// makes an empty directory
    #[arg(long = "graft", value_name = "SRC=DEST", required = true, value_parser = parse_graft)]
    pub grafts: Vec<GraftPoint>,

    /// Source path to leave out of grafted directories (repeatable)
    #[arg(long = "exclude", value_name = "PATH")]
    pub excluded: Vec<String>,

    /// Add Joliet names for Windows systems
    #[arg(long)]
    pub joliet: bool,

    /// Add a UDF filesystem
    #[arg(long)]
    pub udf: bool,

    /// Allow files larger than 4 GiB (ISO9660 level 3)
    #[arg(long)]
    pub iso_level3: bool,

    /// Follow symbolic links instead of recording them
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Volume label
    #[arg(long)]
    pub label: Option<String>,
}

impl LayoutArgs {
    pub fn data_track(&self) -> Result<DataTrack, ExitError> {
        let mut fs = FsFlags::ISO;
        for (set, flag) in [
            (self.joliet, FsFlags::JOLIET),
            (self.udf, FsFlags::UDF),
            (self.iso_level3, FsFlags::ISO_LEVEL3),
            (self.follow_symlinks, FsFlags::SYMLINK),
        ] {
            if set {
                fs |= flag;
            }
        }
        let excluded = self
            .excluded
            .iter()
            .map(|path| source_uri(path))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ExitError::new(codes::FAILURE, e.to_string()))?;
        Ok(DataTrack::new(self.grafts.clone()).fs(fs).excluded(excluded))
    }

    fn context(&self, config: EngineConfig) -> Result<JobContext, ExitError> {
        let track = Track::data(self.data_track()?);
        let mut ctx = JobContext::new(Arc::new(config)).with_tracks([track]);
        if let Some(label) = &self.label {
            ctx = ctx.with_tag(keys::DATA_LABEL, label.as_str());
        }
        Ok(ctx)
    }
}

#[derive(Args, Debug)]
pub struct ImageArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Image file to write
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Graft a checksum manifest of every file at the root of the image
    #[arg(long)]
    pub checksum_files: bool,
}

#[derive(Args, Debug)]
pub struct SizeArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,
}

/// Remote sources are copied locally first.
fn fetch_task() -> Task {
    Task::new(Action::Image).job(LocalTrack::new())
}

/// Build the image; returns the image track.
pub async fn run_image(args: &ImageArgs, config: EngineConfig) -> Result<TrackRef, ExitError> {
    let mut session = Session::new(args.layout.context(config)?);
    let mut tasks = vec![fetch_task()];
    if args.checksum_files {
        tasks.push(Task::new(Action::Image).job(ChecksumFiles::new()));
    }
    let output = TaskOutput {
        track_type: TrackType::Image(ImageFormat::Bin),
        image: Some(args.output.clone()),
        ..TaskOutput::default()
    };
    tasks.push(Task::new(Action::Image).output(output).job(Genisoimage::job()));
    run_tasks(&mut session, tasks).await?;

    session
        .context()
        .produced_tracks()
        .first()
        .cloned()
        .ok_or_else(|| ExitError::new(codes::FAILURE, "genisoimage produced no image"))
}

/// Size the image would have, without writing it.
pub async fn run_size(args: &SizeArgs, config: EngineConfig) -> Result<TrackSize, ExitError> {
    let mut session = Session::new(args.layout.context(config)?);
    run_tasks(&mut session, vec![fetch_task(), Task::new(Action::Size).job(Genisoimage::job())]).await?;
    Ok(session.context().session_output_size())
}

pub async fn handle_image(args: ImageArgs, config: EngineConfig) -> Result<()> {
    let track = run_image(&args, config).await?;
    println!("{}", crate::output::describe_track(&track));
    Ok(())
}

pub async fn handle_size(args: SizeArgs, config: EngineConfig) -> Result<()> {
    let size = run_size(&args, config).await?;
    println!("{} blocks ({})", size.blocks, crate::output::format_bytes(size.bytes));
    Ok(())
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
