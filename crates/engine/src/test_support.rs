// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

#![allow(clippy::panic)]

use crate::config::EngineConfig;
use crate::context::{JobContext, JobScope, TaskOutput, TaskSignal};
use crate::events::SessionEvent;
use crate::link::JobLink;
use crate::session::Session;
use burner_core::{Action, BurnerError, Drive, TrackRef};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Config with a fast tick and temp files under `tmp`.
pub fn test_config(tmp: &Path) -> EngineConfig {
    EngineConfig { tmp_dir: tmp.to_path_buf(), tick_interval_ms: 10, ..EngineConfig::default() }
}

/// Session over `tracks` with a fast tick. Keep the returned dir alive for
/// as long as the session.
pub fn test_session(tracks: Vec<TrackRef>) -> (Session, TempDir) {
    test_session_with(tracks, |config| config)
}

pub fn test_session_with(
    tracks: Vec<TrackRef>,
    configure: impl FnOnce(EngineConfig) -> EngineConfig,
) -> (Session, TempDir) {
    let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let config = configure(test_config(tmp.path()));
    let ctx = JobContext::new(Arc::new(config)).with_tracks(tracks);
    (Session::new(ctx), tmp)
}

/// Signal left on the context by the calls made so far.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Pending,
    Finished,
    NextTrack,
    Error(BurnerError),
}

/// A context already inside a job scope, for driving parsers and
/// callbacks without a loop.
pub struct ScopedContext {
    pub ctx: JobContext,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    _tmp: TempDir,
}

pub fn scoped_context(action: Action, tracks: Vec<TrackRef>) -> ScopedContext {
    scoped_context_with(action, TaskOutput::default(), tracks, None)
}

pub fn scoped_context_with(
    action: Action,
    output: TaskOutput,
    tracks: Vec<TrackRef>,
    target: Option<Arc<dyn Drive>>,
) -> ScopedContext {
    let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let mut ctx = JobContext::new(Arc::new(test_config(tmp.path()))).with_tracks(tracks);
    if let Some(drive) = target {
        ctx = ctx.with_target(drive);
    }
    let events = ctx.subscribe();
    ctx.begin_task(action, output);
    ctx.enter(JobScope {
        slot: 0,
        name: "test".into(),
        link: JobLink::detached(),
        input: None,
        output: None,
        last: true,
    });
    ScopedContext { ctx, events, _tmp: tmp }
}

impl ScopedContext {
    pub fn outcome(&mut self) -> Outcome {
        match self.ctx.take_signal() {
            None => Outcome::Pending,
            Some(TaskSignal::Finished { .. }) => Outcome::Finished,
            Some(TaskSignal::NextTrack { .. }) => Outcome::NextTrack,
            Some(TaskSignal::Error { error, .. }) => Outcome::Error(error),
        }
    }

    pub fn events(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Fractions of the progress events emitted so far.
    pub fn progress(&mut self) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::Progress { fraction, .. } => fraction,
                _ => None,
            })
            .collect()
    }

    /// Leave the job scope, as the loop does between calls.
    pub fn leave(&mut self) {
        self.ctx.leave();
    }
}
