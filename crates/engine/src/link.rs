// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handle jobs keep to reach the session loop from other tasks or threads.

use crate::context::JobContext;
use crate::error::JobError;
use tokio::sync::mpsc;

/// One-shot callback run on the session loop with the context.
pub type IdleCallback = Box<dyn FnOnce(&mut JobContext) -> Result<(), JobError> + Send>;

pub(crate) enum LoopMessage {
    Wake,
    Idle(IdleCallback),
}

pub(crate) struct LoopEvent {
    pub(crate) slot: usize,
    pub(crate) generation: u64,
    pub(crate) message: LoopMessage,
}

/// Sender bound to one job run.
///
/// Events carry the run's generation; once the job is stopped the loop
/// discards anything still queued for that generation.
#[derive(Clone)]
pub struct JobLink {
    slot: usize,
    generation: u64,
    tx: mpsc::UnboundedSender<LoopEvent>,
}

impl JobLink {
    pub(crate) fn new(slot: usize, generation: u64, tx: mpsc::UnboundedSender<LoopEvent>) -> Self {
        Self { slot, generation, tx }
    }

    /// A link nobody listens to.
    pub fn detached() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { slot: usize::MAX, generation: 0, tx }
    }

    /// Ask the loop to call the job's `wake` hook. Returns false when the
    /// session is gone.
    pub fn wake(&self) -> bool {
        self.send(LoopMessage::Wake)
    }

    /// Schedule `callback` on the loop.
    pub fn idle(&self, callback: IdleCallback) -> bool {
        self.send(LoopMessage::Idle(callback))
    }

    fn send(&self, message: LoopMessage) -> bool {
        self.tx
            .send(LoopEvent { slot: self.slot, generation: self.generation, message })
            .is_ok()
    }
}

impl std::fmt::Debug for JobLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobLink").field("slot", &self.slot).field("generation", &self.generation).finish()
    }
}
