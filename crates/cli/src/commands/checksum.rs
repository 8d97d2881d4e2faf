// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `burner checksum`: digest of an image or audio file, or verification
//! against a known digest.

use super::session::run_tasks;
use crate::exit_error::{codes, ExitError};
use anyhow::Result;
use burner_core::{Action, Checksum, ChecksumType, ImageFormat, ImageTrack, Track};
use burner_engine::{EngineConfig, JobContext, Session, Task};
use burner_plugins::ChecksumImage;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct ChecksumArgs {
    /// Image or raw audio file
    pub file: PathBuf,

    /// Digest algorithm: md5, sha1 or sha256 (default: from config)
    #[arg(long = "type", value_name = "TYPE")]
    pub kind: Option<ChecksumType>,

    /// Verify against this hex digest instead of printing one
    #[arg(long, value_name = "DIGEST")]
    pub expect: Option<String>,
}

/// The expected digest, typed by `--type` or by its length.
fn expected(args: &ChecksumArgs) -> Result<Option<Checksum>, ExitError> {
    let Some(text) = &args.expect else {
        return Ok(None);
    };
    let checksum = match args.kind {
        Some(kind) => Checksum::new(kind, text),
        None => Checksum::detect(text),
    };
    checksum
        .map(Some)
        .ok_or_else(|| ExitError::new(codes::FAILURE, format!("'{text}' is not a valid digest")))
}

/// Compute, or verify, the digest of `args.file`.
pub async fn run(args: &ChecksumArgs, config: EngineConfig) -> Result<Checksum, ExitError> {
    let len = std::fs::metadata(&args.file)
        .map_err(|e| ExitError::new(codes::FAILURE, format!("cannot read {}: {e}", args.file.display())))?
        .len();
    let track = Track::image(ImageTrack::new(&args.file, ImageFormat::Bin).with_blocks_from_len(len));
    let expected = expected(args)?;

    let task = match &expected {
        Some(checksum) => {
            track.set_checksum(checksum.clone());
            Task::new(Action::Checksum).job(ChecksumImage::new())
        }
        None => {
            let job = args.kind.map(ChecksumImage::with_type).unwrap_or_default();
            Task::new(Action::Image).job(job)
        }
    };
    let mut session = Session::new(JobContext::new(Arc::new(config)).with_tracks([track.clone()]));
    run_tasks(&mut session, vec![task]).await?;

    track
        .checksum()
        .ok_or_else(|| ExitError::new(codes::FAILURE, "no checksum computed (checksum type is none)"))
}

pub async fn handle(args: ChecksumArgs, config: EngineConfig) -> Result<()> {
    let checksum = run(&args, config).await?;
    if args.expect.is_some() {
        println!("{}: OK", args.file.display());
    } else {
        // md5sum-compatible line
        println!("{}  {}", checksum.value(), args.file.display());
    }
    Ok(())
}

#[cfg(test)]
#[path = "checksum_tests.rs"]
mod tests;
