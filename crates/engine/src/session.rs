// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session runner: drives a chain of tasks on one cooperative loop.
//!
//! Every job call happens here, one at a time, on the task that awaits
//! [`Session::run`]. Jobs reach back only through their [`JobLink`] (wake
//! and idle callbacks) and through context signals (finished track,
//! finished session, error), which the loop acts on after the call that
//! raised them returns.

use crate::config::EngineConfig;
use crate::context::{JobContext, JobScope, TaskOutput, TaskSignal};
use crate::error::JobError;
use crate::events::SessionEvent;
use crate::job::{Activation, ErrorResponse, Job, Started};
use crate::link::{JobLink, LoopEvent, LoopMessage};
use burner_core::{Action, BurnerError, Status, TrackType};
use nix::fcntl::OFlag;
use std::os::fd::OwnedFd;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Restarts a job may ask for on one track before its error is final.
const MAX_RETRIES: u32 = 3;

/// One stage of the chain: jobs performing the same action, piped into
/// each other when more than one is active.
pub struct Task {
    action: Action,
    output: TaskOutput,
    jobs: Vec<Box<dyn Job>>,
}

impl Task {
    pub fn new(action: Action) -> Self {
        Self { action, output: TaskOutput::default(), jobs: Vec::new() }
    }

    pub fn job(mut self, job: impl Job + 'static) -> Self {
        self.jobs.push(Box::new(job));
        self
    }

    pub fn boxed(mut self, job: Box<dyn Job>) -> Self {
        self.jobs.push(job);
        self
    }

    pub fn output(mut self, output: TaskOutput) -> Self {
        self.output = output;
        self
    }

    pub fn output_type(mut self, track_type: TrackType) -> Self {
        self.output.track_type = track_type;
        self
    }

    pub fn action(&self) -> Action {
        self.action
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.jobs.iter().map(|j| j.name()).collect();
        f.debug_struct("Task").field("action", &self.action).field("jobs", &names).finish()
    }
}

struct Slot {
    job: Box<dyn Job>,
    active: bool,
    running: bool,
    generation: u64,
    retries: u32,
    input: Option<Arc<OwnedFd>>,
    output: Option<Arc<OwnedFd>>,
}

/// What the loop does after handling a signal.
enum Flow {
    Continue,
    NextTrack,
    Finished,
    Failed(BurnerError),
}

pub struct Session {
    ctx: JobContext,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<LoopEvent>,
    rx: mpsc::UnboundedReceiver<LoopEvent>,
    tick: Duration,
    generation: u64,
}

impl Session {
    pub fn new(ctx: JobContext) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let tick = ctx.config().tick_interval();
        Self { ctx, cancel: CancellationToken::new(), tx, rx, tick, generation: 0 }
    }

    /// Session over a fresh context for `config`.
    pub fn with_config(config: EngineConfig) -> Self {
        Self::new(JobContext::new(Arc::new(config)))
    }

    pub fn context(&self) -> &JobContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut JobContext {
        &mut self.ctx
    }

    pub fn into_context(self) -> JobContext {
        self.ctx
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        self.ctx.subscribe()
    }

    /// Cancelling this token stops every running job.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn status(&self) -> Status {
        self.ctx.status()
    }

    /// Run the tasks one after the other.
    pub async fn run(&mut self, tasks: Vec<Task>) -> Result<(), JobError> {
        for task in tasks {
            self.run_task(task).await?;
        }
        Ok(())
    }

    /// Run one task to completion, failure or cancellation. Every job is
    /// stopped before this returns.
    pub async fn run_task(&mut self, task: Task) -> Result<(), JobError> {
        let Task { action, output, jobs } = task;
        self.ctx.begin_task(action, output);
        let mut slots: Vec<Slot> = jobs
            .into_iter()
            .map(|job| Slot {
                job,
                active: false,
                running: false,
                generation: 0,
                retries: 0,
                input: None,
                output: None,
            })
            .collect();
        tracing::info!(%action, jobs = slots.len(), tracks = self.ctx.tracks().len(), "task started");

        for i in 0..slots.len() {
            slots[i].active = true;
            let result = self.dispatch(&mut slots, i, |job, ctx| job.activate(ctx));
            match result {
                Some(Activation::Ready) => {}
                Some(Activation::Skip) => {
                    tracing::debug!(job = slots[i].job.name(), "skipped");
                    slots[i].active = false;
                }
                None => slots[i].active = false,
            }
            if let Some(TaskSignal::Error { error, .. }) = self.ctx.take_signal() {
                return Err(error.into());
            }
        }
        if !slots.iter().any(|s| s.active) {
            tracing::info!(%action, "nothing to do");
            self.ctx.complete_tracks();
            return Ok(());
        }

        let result = self.drive(&mut slots).await;
        self.stop_all(&mut slots);
        match &result {
            Ok(()) => tracing::info!(%action, "task finished"),
            Err(e) => tracing::info!(%action, error = %e, "task ended"),
        }
        result
    }

    async fn drive(&mut self, slots: &mut [Slot]) -> Result<(), JobError> {
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        self.start_chain(slots)?;
        loop {
            match self.after_dispatch(slots) {
                Flow::Continue => {}
                Flow::Finished => {
                    self.stop_all(slots);
                    // Stopping may surface a late error
                    if let Some(TaskSignal::Error { error, .. }) = self.ctx.take_signal() {
                        return Err(error.into());
                    }
                    self.ctx.complete_tracks();
                    return Ok(());
                }
                Flow::NextTrack => {
                    self.stop_all(slots);
                    if let Some(TaskSignal::Error { error, .. }) = self.ctx.take_signal() {
                        return Err(error.into());
                    }
                    self.ctx.advance_track();
                    for slot in slots.iter_mut() {
                        slot.retries = 0;
                    }
                    self.start_chain(slots)?;
                    continue;
                }
                Flow::Failed(error) => return Err(error.into()),
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("session cancelled");
                    return Err(JobError::Cancelled);
                }
                Some(event) = self.rx.recv() => self.handle_event(slots, event),
                _ = ticker.tick() => self.tick_all(slots),
            }
        }
    }

    /// Wire pipes between the active jobs and start them, downstream
    /// first so every reader exists before its writer.
    fn start_chain(&mut self, slots: &mut [Slot]) -> Result<(), JobError> {
        let active: Vec<usize> = (0..slots.len()).filter(|i| slots[*i].active).collect();
        for pair in active.windows(2) {
            let (read, write) = nix::unistd::pipe2(OFlag::O_CLOEXEC)
                .map_err(|e| JobError::io("cannot create a pipe", &std::io::Error::from(e)))?;
            slots[pair[0]].output = Some(Arc::new(write));
            slots[pair[1]].input = Some(Arc::new(read));
        }
        for &i in active.iter().rev() {
            self.start_slot(slots, i);
            if self.ctx.has_error() {
                break;
            }
        }
        Ok(())
    }

    fn start_slot(&mut self, slots: &mut [Slot], i: usize) {
        self.generation += 1;
        slots[i].generation = self.generation;
        slots[i].running = true;
        match self.dispatch(slots, i, |job, ctx| job.start(ctx)) {
            Some(Started::Running) => {
                tracing::debug!(job = slots[i].job.name(), "running");
            }
            Some(Started::Done) => {
                tracing::debug!(job = slots[i].job.name(), "done at start");
                self.stop_slot(slots, i);
            }
            None => slots[i].running = false,
        }
    }

    /// Call into job `i` inside its scope. Errors it returns are raised
    /// on the context like any reported error.
    fn dispatch<T>(
        &mut self,
        slots: &mut [Slot],
        i: usize,
        call: impl FnOnce(&mut dyn Job, &mut JobContext) -> Result<T, JobError>,
    ) -> Option<T> {
        let last = slots.iter().rposition(|s| s.active) == Some(i);
        let slot = &mut slots[i];
        let name = slot.job.name().to_string();
        self.ctx.enter(JobScope {
            slot: i,
            name: name.clone(),
            link: JobLink::new(i, slot.generation, self.tx.clone()),
            input: slot.input.clone(),
            output: slot.output.clone(),
            last,
        });
        let result = call(slot.job.as_mut(), &mut self.ctx);
        let value = match result {
            Ok(value) => Some(value),
            Err(JobError::Cancelled) => {
                tracing::debug!(job = %name, "call cancelled");
                None
            }
            Err(e) => {
                // Raised while still in the job's scope
                let _ = self.ctx.error(e.into_burner(&name));
                None
            }
        };
        self.ctx.leave();
        value
    }

    fn handle_event(&mut self, slots: &mut [Slot], event: LoopEvent) {
        let LoopEvent { slot, generation, message } = event;
        let current = slots.get(slot).is_some_and(|s| s.running && s.generation == generation);
        if !current {
            tracing::trace!(slot, generation, "discarding stale loop event");
            return;
        }
        match message {
            LoopMessage::Wake => {
                self.dispatch(slots, slot, |job, ctx| job.wake(ctx));
            }
            LoopMessage::Idle(callback) => {
                self.dispatch(slots, slot, |_, ctx| callback(ctx));
            }
        }
    }

    fn tick_all(&mut self, slots: &mut [Slot]) {
        for i in 0..slots.len() {
            if slots[i].running {
                self.dispatch(slots, i, |job, ctx| job.clock_tick(ctx));
                if self.ctx.has_error() {
                    return;
                }
            }
        }
    }

    /// Act on the signal the last dispatch left on the context.
    fn after_dispatch(&mut self, slots: &mut [Slot]) -> Flow {
        let Some(signal) = self.ctx.take_signal() else {
            if slots.iter().any(|s| s.running) {
                return Flow::Continue;
            }
            // Every job returned Done without a word
            return if self.ctx.current_index() + 1 < self.ctx.tracks().len() {
                Flow::NextTrack
            } else {
                Flow::Finished
            };
        };
        let last = slots.iter().rposition(|s| s.active);
        match signal {
            TaskSignal::Finished { slot } | TaskSignal::NextTrack { slot } if Some(slot) != last => {
                // An upstream job is done; closing its end of the pipe
                // lets the next stage see EOF
                tracing::debug!(job = slots[slot].job.name(), "upstream job finished");
                self.stop_slot(slots, slot);
                Flow::Continue
            }
            TaskSignal::Finished { .. } => Flow::Finished,
            TaskSignal::NextTrack { .. } => Flow::NextTrack,
            TaskSignal::Error { slot, error } => {
                let response = if slots[slot].retries < MAX_RETRIES {
                    self.offer_error(slots, slot, &error)
                } else {
                    ErrorResponse::Propagate
                };
                match response {
                    ErrorResponse::Retry => {
                        slots[slot].retries += 1;
                        tracing::info!(job = slots[slot].job.name(), kind = %error.kind(), "retrying");
                        self.stop_slot(slots, slot);
                        let _ = self.ctx.take_signal();
                        self.start_slot(slots, slot);
                        Flow::Continue
                    }
                    ErrorResponse::Propagate => Flow::Failed(error),
                }
            }
        }
    }

    fn offer_error(&mut self, slots: &mut [Slot], i: usize, error: &BurnerError) -> ErrorResponse {
        let kind = error.kind();
        self.dispatch(slots, i, |job, ctx| Ok(job.on_error(ctx, kind))).unwrap_or(ErrorResponse::Propagate)
    }

    fn stop_slot(&mut self, slots: &mut [Slot], i: usize) {
        self.dispatch(slots, i, |job, ctx| job.stop(ctx));
        let slot = &mut slots[i];
        slot.running = false;
        // Anything still queued for this run is now stale
        self.generation += 1;
        slot.generation = self.generation;
        slot.input = None;
        slot.output = None;
    }

    /// Stop every job, downstream last so writers close first.
    fn stop_all(&mut self, slots: &mut [Slot]) {
        for i in 0..slots.len() {
            if slots[i].active {
                self.stop_slot(slots, i);
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("ctx", &self.ctx).field("tick", &self.tick).finish()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
