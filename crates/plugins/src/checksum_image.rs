// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Whole-track checksum: an image file, a local stream file or the first
//! blocks of a source disc.
//!
//! In IMAGE and RECORD tasks the digest is attached to the track. In a
//! CHECKSUM task it is compared with the digest already attached, and a
//! difference is a `BadChecksum` error.

use crate::digest::hash_reader;
use burner_core::{uri, Action, BurnAction, BurnerError, Checksum, ChecksumType, ErrorKind, TrackKind, TrackRef};
use burner_engine::{Activation, Job, JobContext, JobError, Started, WorkerOutcome, WorkerThread};
use std::fs::File;
use std::path::PathBuf;

const NAME: &str = "checksum-image";

#[derive(Default)]
pub struct ChecksumImage {
    kind: Option<ChecksumType>,
    worker: Option<WorkerThread>,
}

impl ChecksumImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `kind` instead of the configured algorithm.
    pub fn with_type(kind: ChecksumType) -> Self {
        Self { kind: Some(kind), worker: None }
    }

    fn kind_for(&self, ctx: &JobContext, expected: Option<&Checksum>) -> ChecksumType {
        expected.map(Checksum::kind).or(self.kind).unwrap_or(ctx.config().checksum)
    }
}

/// File to read, and how many bytes of it.
fn source(track: &TrackRef) -> Result<(PathBuf, Option<u64>), JobError> {
    match track.kind() {
        TrackKind::Image(image) => Ok((image.image.clone(), None)),
        TrackKind::Stream(stream) => match uri::to_path(&stream.source) {
            Some(path) => Ok((path, None)),
            None => Err(JobError::new(
                ErrorKind::FileNotLocal,
                format!("\"{}\" is not a local file", stream.source),
            )),
        },
        TrackKind::Disc(disc) => {
            let Some(drive) = disc.drive() else {
                return Err(JobError::new(ErrorKind::MediumNone, "the source drive is gone"));
            };
            let bytes = track.size().map(|s| s.bytes);
            Ok((drive.device_path().to_path_buf(), bytes))
        }
        TrackKind::Data(_) => burner_engine::not_supported(NAME, "checksum of a data track"),
    }
}

impl Job for ChecksumImage {
    fn name(&self) -> &str {
        NAME
    }

    fn activate(&mut self, ctx: &mut JobContext) -> Result<Activation, JobError> {
        if !matches!(ctx.action(), Action::Image | Action::Record | Action::Checksum) {
            return Ok(Activation::Skip);
        }
        let Ok(track) = ctx.current_track() else {
            return Ok(Activation::Skip);
        };
        if matches!(track.kind(), TrackKind::Data(_)) {
            return Ok(Activation::Skip);
        }
        if self.kind_for(ctx, track.checksum().as_ref()) == ChecksumType::None {
            return Ok(Activation::Skip);
        }
        Ok(Activation::Ready)
    }

    fn start(&mut self, ctx: &mut JobContext) -> Result<Started, JobError> {
        if self.worker.is_some() {
            return Ok(Started::Running);
        }
        let track = ctx.current_track()?;
        let (path, limit) = source(&track)?;
        let expected = if ctx.action() == Action::Checksum { track.checksum() } else { None };
        if ctx.action() == Action::Checksum && expected.is_none() {
            ctx.error(BurnerError::new(
                ErrorKind::ChecksumWarning,
                "the track has no checksum to verify against",
            ))?;
        }
        let kind = self.kind_for(ctx, expected.as_ref());
        ctx.set_current_action(BurnAction::Checksum, None, false)?;
        tracing::info!(job = NAME, path = %path.display(), %kind, "computing checksum");

        let worker = WorkerThread::spawn(NAME, ctx.link()?, move |scope| {
            let result = File::open(&path)
                .map_err(|e| JobError::io(format!("cannot open {}", path.display()), &e))
                .and_then(|mut file| {
                    let len = file.metadata().map(|m| m.len()).unwrap_or(0);
                    scope.set_total(limit.unwrap_or(len));
                    hash_reader(kind, &mut file, limit, scope)
                });
            let computed = match result {
                Ok(checksum) => checksum,
                Err(e) => return WorkerOutcome::from_error(e, NAME),
            };
            WorkerOutcome::complete(move |ctx| {
                match expected {
                    Some(expected) if expected != computed => {
                        return ctx.error(BurnerError::new(
                            ErrorKind::BadChecksum,
                            format!("checksum mismatch: expected {expected}, found {computed}"),
                        ));
                    }
                    Some(_) => ctx.log(&format!("checksum verified ({computed})")),
                    None => {
                        ctx.log(&format!("checksum {computed}"));
                        track.set_checksum(computed);
                    }
                }
                ctx.finished_track()
            })
        })?;
        self.worker = Some(worker);
        Ok(Started::Running)
    }

    fn clock_tick(&mut self, ctx: &mut JobContext) -> Result<(), JobError> {
        let Some(worker) = &self.worker else {
            return Ok(());
        };
        let progress = worker.progress();
        if progress.total() > 0 {
            ctx.set_progress(progress.done() as f64 / progress.total() as f64)?;
        }
        Ok(())
    }

    fn stop(&mut self, _ctx: &mut JobContext) -> Result<(), JobError> {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "checksum_image_tests.rs"]
mod tests;
