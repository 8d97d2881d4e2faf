// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `burner burn` and `burner blank` specs, with a stand-in wodim.

use crate::prelude::*;

fn workspace(wodim_body: &str) -> Workspace {
    let ws = Workspace::new();
    let tool = ws.script("bin/wodim", &format!("#!/bin/sh\necho \"$*\" > \"$(dirname \"$0\")/argv\"\n{wodim_body}"));
    ws.file("config.toml", format!("[tools]\nwodim = \"{}\"\n", tool.display()));
    ws
}

fn argv(ws: &Workspace) -> String {
    std::fs::read_to_string(ws.path("bin/argv")).unwrap()
}

#[test]
fn image_is_recorded() {
    let ws = workspace("echo 'Track 01:    1 of    1 MB written.'\necho 'Fixating...'\n");
    let image = ws.file("disc.iso", vec![0u8; 4096]);

    ws.burner()
        .args(&["burn", "--device", "/dev/sr0", "--speed", "8", "--dummy", image.to_str().unwrap()])
        .passes();

    let argv = argv(&ws);
    assert!(argv.starts_with("-v dev=/dev/sr0 speed=8 -dummy -tao -data"), "{argv}");
}

#[test]
fn checksum_is_printed_after_recording() {
    let ws = workspace("exit 0\n");
    let image = ws.file("disc.iso", "hello");

    ws.burner()
        .args(&["burn", "--device", "/dev/sr0", "--checksum", image.to_str().unwrap()])
        .passes()
        .stdout_has("md5:5d41402abc4b2a76b9719d911017c592");
}

#[test]
fn drive_failure_is_reported() {
    let ws = workspace("echo \"wodim: Device or resource busy. Cannot open '/dev/sr0'.\" >&2\nexit 255\n");
    let image = ws.file("disc.iso", vec![0u8; 2048]);

    ws.burner()
        .args(&["burn", "--device", "/dev/sr0", image.to_str().unwrap()])
        .exits(3)
        .stderr_has("the drive is busy");
}

#[test]
fn nothing_to_burn() {
    let ws = workspace("exit 0\n");
    ws.burner().args(&["burn", "--device", "/dev/sr0"]).exits(3).stderr_has("nothing to burn");
}

#[test]
fn blank_runs_a_full_blank_by_default() {
    let ws = workspace("echo 'Blanking PMA, TOC, pregap'\n");
    ws.burner().args(&["blank", "--device", "/dev/sr0"]).passes();
    assert_eq!(argv(&ws), "-v dev=/dev/sr0 blank=all\n");
}
