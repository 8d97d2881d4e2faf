// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `burner fetch`: make a local copy of a URI through the configured
//! mirrors.

use super::session::run_tasks;
use crate::exit_error::{codes, ExitError};
use anyhow::Result;
use burner_core::{uri, Action, StreamFormat, StreamTrack, Track};
use burner_engine::{EngineConfig, JobContext, Session, Task};
use burner_plugins::LocalTrack;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Remote URI (resolved through `[mirrors]`) or local path
    pub uri: String,

    /// Where to put the copy
    pub dest: PathBuf,
}

fn copy_out(source: &Path, dest: &Path) -> Result<u64, ExitError> {
    std::fs::copy(source, dest).map_err(|e| {
        ExitError::new(codes::FAILURE, format!("cannot copy {} to {}: {e}", source.display(), dest.display()))
    })
}

/// Copy `args.uri` to `args.dest`; returns the bytes copied.
pub async fn run(args: &FetchArgs, config: EngineConfig) -> Result<u64, ExitError> {
    let track = Track::stream(StreamTrack::new(args.uri.clone(), StreamFormat::UNDEFINED));
    let mut session = Session::new(JobContext::new(Arc::new(config)).with_tracks([track]));
    run_tasks(&mut session, vec![Task::new(Action::Image).job(LocalTrack::new())]).await?;

    // The session copy lives in its temp dir: move it out before the
    // session is dropped.
    let local = session
        .context()
        .produced_tracks()
        .first()
        .and_then(|t| t.as_stream().map(|s| s.source.clone()))
        .unwrap_or_else(|| args.uri.clone());
    let Some(source) = uri::to_path(&local) else {
        return Err(ExitError::new(codes::FAILURE, format!("\"{local}\" is not a local file")));
    };
    copy_out(&source, &args.dest)
}

pub async fn handle(args: FetchArgs, config: EngineConfig) -> Result<()> {
    let bytes = run(&args, config).await?;
    println!("{} ({})", args.dest.display(), crate::output::format_bytes(bytes));
    Ok(())
}

#[cfg(test)]
#[path = "fetch_tests.rs"]
mod tests;
