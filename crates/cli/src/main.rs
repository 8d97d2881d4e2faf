// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! burner: build, checksum and record disc images from the command line

mod args;
mod color;
mod commands;
mod exit_error;
mod output;

use anyhow::{Context, Result};
use burner_engine::EngineConfig;
use clap::Parser;
use exit_error::ExitError;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "burner", version, about = "Build, checksum and record disc images", styles = color::styles())]
struct Cli {
    /// Config file (default: $BURNER_CONFIG, else the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Debug logging (overridden by BURNER_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: commands::Command,
}

/// Filter from `BURNER_LOG`, else `info` (`debug` with `-v`).
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("BURNER_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load(path)?.with_env_overrides(),
        None => EngineConfig::load_default()?,
    };
    tracing::debug!(?config, "configuration");
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("cannot start the async runtime")?;
    runtime.block_on(commands::handle(cli.command, config))
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(e) = run(cli) {
        let code = match e.downcast_ref::<ExitError>() {
            Some(exit) => {
                eprintln!("error: {}", exit.message);
                exit.code
            }
            None => {
                eprintln!("error: {e:#}");
                exit_error::codes::FAILURE
            }
        };
        std::process::exit(code);
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
