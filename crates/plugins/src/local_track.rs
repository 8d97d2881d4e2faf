// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Makes every source of a track readable with plain file I/O.
//!
//! Non-local URIs are resolved through the configured mirrors and copied
//! into the session temp dir; the track is then handed on with its URIs
//! rewritten. Tracks that are already local pass through untouched.

use burner_core::{uri, BurnAction, ErrorKind, TrackKind, TrackRef};
use burner_engine::{transfer, Activation, Job, JobContext, JobError, Started, WorkerOutcome, WorkerThread};
use std::collections::HashMap;
use std::path::PathBuf;

const NAME: &str = "local-track";

#[derive(Default)]
pub struct LocalTrack {
    worker: Option<WorkerThread>,
}

impl LocalTrack {
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_local(track: &TrackRef) -> bool {
    match track.kind() {
        TrackKind::Data(data) => data.is_local(),
        TrackKind::Stream(stream) => uri::is_local(&stream.source),
        TrackKind::Image(_) | TrackKind::Disc(_) => true,
    }
}

fn remote_uris(track: &TrackRef) -> Vec<String> {
    match track.kind() {
        TrackKind::Data(data) => data
            .grafts
            .iter()
            .filter_map(|g| g.uri.clone())
            .filter(|u| !uri::is_local(u))
            .collect(),
        TrackKind::Stream(stream) if !uri::is_local(&stream.source) => vec![stream.source.clone()],
        _ => Vec::new(),
    }
}

/// `track` with every URI found in `local` replaced by its local copy.
fn rewrite(track: &TrackRef, local: &HashMap<String, String>) -> TrackKind {
    let swap = |u: &str| local.get(u).cloned().unwrap_or_else(|| u.to_string());
    match track.kind() {
        TrackKind::Data(data) => {
            let mut data = data.clone();
            for graft in &mut data.grafts {
                if let Some(u) = graft.uri.as_deref() {
                    graft.uri = Some(swap(u));
                }
            }
            TrackKind::Data(data)
        }
        TrackKind::Stream(stream) => {
            let mut stream = stream.clone();
            stream.source = swap(&stream.source);
            TrackKind::Stream(stream)
        }
        other => other.clone(),
    }
}

impl Job for LocalTrack {
    fn name(&self) -> &str {
        NAME
    }

    fn activate(&mut self, ctx: &mut JobContext) -> Result<Activation, JobError> {
        if ctx.tracks().iter().all(is_local) {
            tracing::debug!(job = NAME, "every source is local");
            return Ok(Activation::Skip);
        }
        Ok(Activation::Ready)
    }

    fn start(&mut self, ctx: &mut JobContext) -> Result<Started, JobError> {
        if self.worker.is_some() {
            return Ok(Started::Running);
        }
        let track = ctx.current_track()?;
        let uris = remote_uris(&track);
        if uris.is_empty() {
            ctx.add_track(track)?;
            ctx.finished_track()?;
            return Ok(Started::Done);
        }

        let mut copies = Vec::with_capacity(uris.len());
        for remote in uris {
            let Some(source) = ctx.config().mirror_for(&remote) else {
                return Err(JobError::new(
                    ErrorKind::FileNotLocal,
                    format!("\"{remote}\" is not a local file and no mirror provides it"),
                ));
            };
            let name = uri::basename(&remote).unwrap_or_else(|| "file".to_string());
            let dest: PathBuf = ctx.tmp_dir()?.join(name);
            copies.push((remote, source, dest));
        }
        ctx.set_current_action(BurnAction::FileCopy, None, false)?;

        let worker = WorkerThread::spawn(NAME, ctx.link()?, move |scope| {
            let mut total = 0;
            for (_, source, _) in &copies {
                match transfer::total_size(source) {
                    Ok(size) => total += size,
                    Err(e) => return WorkerOutcome::from_error(e, NAME),
                }
            }
            scope.set_total(total);

            let mut base = 0;
            let mut local = HashMap::new();
            for (remote, source, dest) in copies {
                tracing::info!(job = NAME, %remote, source = %source.display(), "copying");
                let copied = transfer::copy(&source, &dest, scope.token(), |done, _| scope.set_done(base + done));
                match copied {
                    Ok(bytes) => base += bytes,
                    Err(e) => return WorkerOutcome::from_error(e, NAME),
                }
                local.insert(remote, uri::from_path(&dest));
            }
            WorkerOutcome::complete(move |ctx| {
                ctx.log(&format!("{} sources copied locally", local.len()));
                ctx.add_track(track.derive(rewrite(&track, &local)))?;
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
#[path = "local_track_tests.rs"]
mod tests;
