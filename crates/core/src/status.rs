// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-in-time status of a long-running entity.

use crate::error::BurnerError;

/// Outcome category of a [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusResult {
    Ok,
    NotReady,
    Running,
    Error,
}

crate::simple_display! {
    StatusResult {
        Ok => "ok",
        NotReady => "not_ready",
        Running => "running",
        Error => "error",
    }
}

/// Immutable status snapshot, built fresh for every query.
///
/// `progress` is only meaningful for [`StatusResult::NotReady`] and `error`
/// only for [`StatusResult::Error`]; the constructors enforce this.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    result: StatusResult,
    progress: f64,
    current_action: Option<String>,
    error: Option<BurnerError>,
}

impl Status {
    pub fn ok() -> Self {
        Self { result: StatusResult::Ok, progress: -1.0, current_action: None, error: None }
    }

    /// Not ready yet; `progress` is clamped to `[0, 1]`, or `None` when unknown.
    pub fn not_ready(progress: Option<f64>, current_action: Option<String>) -> Self {
        Self {
            result: StatusResult::NotReady,
            progress: progress.map(|p| p.clamp(0.0, 1.0)).unwrap_or(-1.0),
            current_action,
            error: None,
        }
    }

    pub fn running(current_action: Option<String>) -> Self {
        Self { result: StatusResult::Running, progress: -1.0, current_action, error: None }
    }

    pub fn failed(error: BurnerError) -> Self {
        Self { result: StatusResult::Error, progress: -1.0, current_action: None, error: Some(error) }
    }

    pub fn result(&self) -> StatusResult {
        self.result
    }

    /// Progress in `[0, 1]`, only when not ready and known.
    pub fn progress(&self) -> Option<f64> {
        (self.result == StatusResult::NotReady && self.progress >= 0.0).then_some(self.progress)
    }

    pub fn current_action(&self) -> Option<&str> {
        self.current_action.as_deref()
    }

    pub fn error(&self) -> Option<&BurnerError> {
        self.error.as_ref()
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
