// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors returned by job lifecycle calls and context accessors.

use burner_core::{BurnerError, ErrorKind};
use thiserror::Error;

/// Outcome of a failed job or context call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// The call was made outside a running job
    #[error("not ready: {0}")]
    NotReady(&'static str),
    /// The operation makes no sense for the current action
    #[error("not supported: {0}")]
    NotSupported(&'static str),
    /// Work was cut off by a stop request
    #[error("cancelled")]
    Cancelled,
    #[error(transparent)]
    Burner(#[from] BurnerError),
}

impl JobError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        JobError::Burner(BurnerError::new(kind, message))
    }

    pub fn general(message: impl Into<String>) -> Self {
        JobError::Burner(BurnerError::general(message))
    }

    pub fn io(context: impl std::fmt::Display, err: &std::io::Error) -> Self {
        JobError::Burner(BurnerError::io(context, err))
    }

    /// The domain error to surface to the user, if this is one.
    pub fn as_burner(&self) -> Option<&BurnerError> {
        match self {
            JobError::Burner(e) => Some(e),
            _ => None,
        }
    }

    /// Convert into a domain error, mapping the sentinels to a
    /// plugin-misbehaviour report.
    pub fn into_burner(self, job: &str) -> BurnerError {
        match self {
            JobError::Burner(e) => e,
            other => BurnerError::new(
                ErrorKind::PluginMisbehavior,
                format!("{job} did not behave properly ({other})"),
            ),
        }
    }
}

/// Log and return [`JobError::NotSupported`].
pub fn not_supported<T>(job: &str, what: &'static str) -> Result<T, JobError> {
    tracing::debug!(job, what, "not supported");
    Err(JobError::NotSupported(what))
}

/// Log and return [`JobError::NotReady`].
pub fn not_ready<T>(job: &str, what: &'static str) -> Result<T, JobError> {
    tracing::debug!(job, what, "not ready");
    Err(JobError::NotReady(what))
}
