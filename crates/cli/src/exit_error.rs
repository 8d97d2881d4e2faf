// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use burner_core::ErrorKind;
use burner_engine::JobError;
use std::fmt;

pub mod codes {
    pub const FAILURE: i32 = 1;
    /// A computed checksum differs from the expected one
    pub const BAD_CHECKSUM: i32 = 2;
    /// Nothing to burn, or no tool/drive to do it with
    pub const UNAVAILABLE: i32 = 3;
    /// Interrupted (SIGINT convention)
    pub const CANCELLED: i32 = 130;
}

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<JobError> for ExitError {
    fn from(err: JobError) -> Self {
        let code = match &err {
            JobError::Cancelled => codes::CANCELLED,
            JobError::Burner(e) => match e.kind() {
                ErrorKind::BadChecksum => codes::BAD_CHECKSUM,
                ErrorKind::Empty
                | ErrorKind::MissingAppAndPlugin
                | ErrorKind::MediumNone
                | ErrorKind::DriveBusy => codes::UNAVAILABLE,
                _ => codes::FAILURE,
            },
            JobError::NotReady(_) | JobError::NotSupported(_) => codes::FAILURE,
        };
        Self::new(code, err.to_string())
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
