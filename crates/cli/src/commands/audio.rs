// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `burner audio`: extract CD-audio tracks, ready to be recorded, from
//! WAV or raw PCM files.

use super::session::run_tasks;
use crate::args::parse_track;
use crate::exit_error::{codes, ExitError};
use anyhow::Result;
use burner_core::{Action, StreamFormat, StreamTrack, Track, TrackRef, TrackType};
use burner_engine::{EngineConfig, JobContext, Session, Task, TaskOutput};
use burner_plugins::{LocalTrack, Transcode};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct AudioArgs {
    /// FILE[@START-END] (repeatable); times as SECONDS or MM:SS
    #[arg(long = "track", value_name = "FILE[@START-END]", required = true, value_parser = parse_track)]
    pub tracks: Vec<StreamTrack>,

    /// Directory receiving trackNN.raw files
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,
}

/// Transcode every track into `args.output`; returns the raw tracks.
pub async fn run(args: &AudioArgs, config: EngineConfig) -> Result<Vec<TrackRef>, ExitError> {
    std::fs::create_dir_all(&args.output).map_err(|e| {
        ExitError::new(codes::FAILURE, format!("cannot create {}: {e}", args.output.display()))
    })?;
    let tracks: Vec<TrackRef> = args.tracks.iter().cloned().map(Track::stream).collect();
    let mut session = Session::new(JobContext::new(Arc::new(config)).with_tracks(tracks));

    let output = TaskOutput {
        track_type: TrackType::Stream(StreamFormat::RAW),
        dir: Some(args.output.clone()),
        ..TaskOutput::default()
    };
    let tasks = vec![
        Task::new(Action::Image).job(LocalTrack::new()),
        Task::new(Action::Image).output(output).job(Transcode::new()),
    ];
    run_tasks(&mut session, tasks).await?;
    Ok(session.context().produced_tracks().to_vec())
}

pub async fn handle(args: AudioArgs, config: EngineConfig) -> Result<()> {
    for track in run(&args, config).await? {
        println!("{}", crate::output::describe_track(&track));
    }
    Ok(())
}

#[cfg(test)]
#[path = "audio_tests.rs"]
mod tests;
