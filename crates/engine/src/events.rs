// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notifications a session emits to whoever presents it.

use burner_core::{BurnAction, BurnerError, TrackRef};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Progress {
        /// Fraction of the current task done, when known
        fraction: Option<f64>,
        /// Bytes written in the current task
        written: u64,
        /// Bytes per second
        rate: Option<u64>,
        remaining: Option<Duration>,
    },
    Action {
        action: BurnAction,
        label: String,
    },
    /// Interrupting now could leave the medium unusable
    Dangerous(bool),
    TrackAdded(TrackRef),
    /// Non-fatal error; the chain carries on
    Warning(BurnerError),
    Log {
        job: String,
        message: String,
    },
}
