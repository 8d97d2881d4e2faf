// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI help output specs

use crate::prelude::*;

#[test]
fn help_lists_every_command() {
    let run = cli().args(&["--help"]).passes().stdout_has("Usage:");
    for command in ["checksum", "fetch", "image", "size", "audio", "burn", "blank"] {
        assert!(run.stdout().contains(command), "missing {command}");
    }
}

#[test]
fn command_help_shows_usage() {
    for command in ["checksum", "fetch", "image", "size", "audio", "burn", "blank"] {
        cli().args(&[command, "--help"]).passes().stdout_has("Usage:");
    }
}

#[test]
fn version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.2");
}

#[test]
fn no_command_is_a_usage_error() {
    cli().exits(2).stderr_has("Usage:");
}

#[test]
fn invalid_config_file_is_reported() {
    let ws = Workspace::new();
    ws.file("config.toml", "tick_interval_ms = \"soon\"\n");
    ws.file("a.iso", "x");
    ws.burner()
        .args(&["checksum", ws.path("a.iso").to_str().unwrap()])
        .exits(1)
        .stderr_has("invalid config");
}
