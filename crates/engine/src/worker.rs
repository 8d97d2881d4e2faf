// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background thread for blocking work owned by a job.
//!
//! The work closure never touches the [`JobContext`]. It returns a
//! [`WorkerOutcome`]: either a one-shot callback the loop runs with the
//! context, or `Cancelled`. A cancelled worker never schedules its
//! callback, and [`WorkerThread::stop`] only returns once the thread is
//! gone, so nothing reaches the context after `stop`.

use crate::context::JobContext;
use crate::error::JobError;
use crate::link::{IdleCallback, JobLink};
use burner_core::BurnerError;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const IO_RETRY_DELAY: Duration = Duration::from_millis(10);

pub enum WorkerOutcome {
    /// Run the callback on the loop
    Complete(IdleCallback),
    /// Stopped before completion; nothing to report
    Cancelled,
}

impl WorkerOutcome {
    pub fn complete<F>(callback: F) -> Self
    where
        F: FnOnce(&mut JobContext) -> Result<(), JobError> + Send + 'static,
    {
        WorkerOutcome::Complete(Box::new(callback))
    }

    pub fn failed(error: BurnerError) -> Self {
        Self::complete(move |ctx| ctx.error(error))
    }

    /// `Cancelled` stays cancelled; anything else is reported as an error.
    pub fn from_error(error: JobError, job: &str) -> Self {
        match error {
            JobError::Cancelled => WorkerOutcome::Cancelled,
            other => Self::failed(other.into_burner(job)),
        }
    }
}

/// Byte counters shared with the loop. Monotonic, so a stale read only
/// under-reports.
#[derive(Debug, Default)]
pub struct WorkerProgress {
    done: AtomicU64,
    total: AtomicU64,
}

impl WorkerProgress {
    pub fn done(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

/// What the work closure sees. A default scope is tied to no thread, for
/// running the same work inline.
#[derive(Default)]
pub struct WorkerScope {
    cancel: CancellationToken,
    progress: Arc<WorkerProgress>,
}

impl WorkerScope {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `Err(Cancelled)` once stop was requested.
    pub fn check(&self) -> Result<(), JobError> {
        if self.is_cancelled() {
            Err(JobError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn set_total(&self, total: u64) {
        self.progress.total.store(total, Ordering::Relaxed);
    }

    pub fn add_done(&self, bytes: u64) {
        self.progress.done.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn set_done(&self, bytes: u64) {
        self.progress.done.store(bytes, Ordering::Relaxed);
    }

    /// Run `op`, retrying EINTR and EAGAIN after a short pause.
    pub fn retry_io<T>(&self, mut op: impl FnMut() -> io::Result<T>) -> Result<T, JobError> {
        loop {
            self.check()?;
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if matches!(e.kind(), io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock) => {
                    std::thread::sleep(IO_RETRY_DELAY);
                }
                Err(e) => return Err(JobError::io("i/o error", &e)),
            }
        }
    }
}

pub struct WorkerThread {
    name: String,
    handle: Option<JoinHandle<()>>,
    cancel: CancellationToken,
    progress: Arc<WorkerProgress>,
}

impl WorkerThread {
    pub fn spawn<F>(name: &str, link: JobLink, work: F) -> Result<Self, JobError>
    where
        F: FnOnce(&WorkerScope) -> WorkerOutcome + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let progress = Arc::new(WorkerProgress::default());
        let scope = WorkerScope { cancel: cancel.clone(), progress: progress.clone() };
        let job = name.to_string();
        let handle = std::thread::Builder::new()
            .name(format!("{name}-worker"))
            .spawn(move || match work(&scope) {
                WorkerOutcome::Complete(callback) if !scope.is_cancelled() => {
                    if !link.idle(callback) {
                        tracing::debug!(job, "session gone before worker completed");
                    }
                }
                _ => tracing::debug!(job, "worker cancelled"),
            })
            .map_err(|e| JobError::io(format!("cannot start {name} worker"), &e))?;
        tracing::debug!(job = name, "worker started");
        Ok(Self { name: name.to_string(), handle: Some(handle), cancel, progress })
    }

    pub fn progress(&self) -> &WorkerProgress {
        &self.progress
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancel and wait for the thread. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!(job = %self.name, "worker panicked");
            }
        }
    }
}

impl Drop for WorkerThread {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
