// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The contract every pipeline stage implements.

use crate::context::JobContext;
use crate::error::JobError;
use burner_core::ErrorKind;

/// Result of [`Job::activate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The job takes part in the task
    Ready,
    /// Nothing to do for the current flags/tracks; treated exactly like an
    /// immediate successful completion with no side effects
    Skip,
}

/// Result of a successful [`Job::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Started {
    /// Work continues asynchronously; the loop runs until the job signals
    /// completion through the context
    Running,
    /// Already complete; no loop needed for this job
    Done,
}

/// What the infrastructure should do with an error a job raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorResponse {
    /// Abort the task and surface the error
    Propagate,
    /// The job reconfigured itself; stop and start it again
    Retry,
}

/// One stage of the pipeline.
///
/// All methods are called from the session loop only, one at a time.
/// `start` never blocks; `stop` may block until every thread or child the
/// job owns is gone, and must be a no-op when nothing is running.
pub trait Job: Send {
    fn name(&self) -> &str;

    fn activate(&mut self, _ctx: &mut JobContext) -> Result<Activation, JobError> {
        Ok(Activation::Ready)
    }

    fn start(&mut self, ctx: &mut JobContext) -> Result<Started, JobError>;

    /// Periodic poll while the job runs.
    fn clock_tick(&mut self, _ctx: &mut JobContext) -> Result<(), JobError> {
        Ok(())
    }

    /// Called when one of the job's own tasks or threads asked for
    /// attention through [`JobLink::wake`](crate::JobLink::wake).
    fn wake(&mut self, _ctx: &mut JobContext) -> Result<(), JobError> {
        Ok(())
    }

    fn stop(&mut self, _ctx: &mut JobContext) -> Result<(), JobError> {
        Ok(())
    }

    /// Offered an error this job raised, before the task is aborted.
    fn on_error(&mut self, _ctx: &mut JobContext, _kind: ErrorKind) -> ErrorResponse {
        ErrorResponse::Propagate
    }
}
