// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drive a session from the terminal: events rendered on stderr, Ctrl-C
//! cancels.

use crate::exit_error::ExitError;
use crate::output::Printer;
use burner_engine::{Session, Task};

pub async fn run_tasks(session: &mut Session, tasks: Vec<Task>) -> Result<(), ExitError> {
    let mut events = session.subscribe();
    let cancel = session.cancel_token();
    let mut printer = Printer::new();

    let result = {
        let run = session.run(tasks);
        tokio::pin!(run);
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);
        let mut interrupted = false;
        loop {
            tokio::select! {
                result = &mut run => break result,
                Some(event) = events.recv() => printer.show(&event),
                _ = &mut interrupt, if !interrupted => {
                    tracing::info!("interrupted, stopping the session");
                    interrupted = true;
                    cancel.cancel();
                }
            }
        }
    };

    while let Ok(event) = events.try_recv() {
        printer.show(&event);
    }
    printer.finish();
    result.map_err(ExitError::from)
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
