// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! burner-engine: job contract, session loop and the helpers jobs are
//! built from (subprocess engine, worker thread, transfer)

pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod events;
pub mod job;
pub mod link;
pub mod process;
pub mod session;
pub mod session_log;
pub mod temp;
pub mod transfer;
pub mod worker;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{ConfigError, EngineConfig};
pub use context::{JobContext, TaskOutput};
pub use error::{not_ready, not_supported, JobError};
pub use events::SessionEvent;
pub use job::{Activation, ErrorResponse, Job, Started};
pub use link::{IdleCallback, JobLink};
pub use process::{Argv, DeferredError, PostAction, Process, ProcessSpec};
pub use session::{Session, Task};
pub use worker::{WorkerOutcome, WorkerProgress, WorkerScope, WorkerThread};
