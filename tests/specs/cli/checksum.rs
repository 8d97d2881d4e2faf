// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `burner checksum` specs

use crate::prelude::*;

const CONTENTS: &[u8] = b"a small disc image";

fn md5_hex() -> String {
    format!("{:x}", md5::compute(CONTENTS))
}

#[test]
fn prints_an_md5sum_line() {
    let ws = Workspace::new();
    let image = ws.file("disc.iso", CONTENTS);
    let path = image.to_str().unwrap();

    ws.burner().args(&["checksum", path]).passes().stdout_has(&format!("{}  {path}", md5_hex()));
}

#[test]
fn type_selects_the_algorithm() {
    let ws = Workspace::new();
    let image = ws.file("disc.iso", "hello");

    ws.burner()
        .args(&["checksum", "--type", "sha256", image.to_str().unwrap()])
        .passes()
        .stdout_has("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824");
}

#[test]
fn configured_type_is_the_default() {
    let ws = Workspace::new();
    ws.file("config.toml", "checksum = \"sha1\"\n");
    let image = ws.file("disc.iso", "hello");

    ws.burner()
        .args(&["checksum", image.to_str().unwrap()])
        .passes()
        .stdout_has("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
}

#[test]
fn matching_digest_passes() {
    let ws = Workspace::new();
    let image = ws.file("disc.iso", CONTENTS);

    ws.burner()
        .args(&["checksum", image.to_str().unwrap(), "--expect", &md5_hex().to_uppercase()])
        .passes()
        .stdout_has(": OK");
}

#[test]
fn mismatch_exits_with_code_two() {
    let ws = Workspace::new();
    let image = ws.file("disc.iso", CONTENTS);

    ws.burner()
        .args(&["checksum", image.to_str().unwrap(), "--expect", "0123456789abcdef0123456789abcdef"])
        .exits(2)
        .stderr_has("checksum mismatch");
}

#[test]
fn missing_file_fails() {
    let ws = Workspace::new();
    ws.burner()
        .args(&["checksum", ws.path("absent.iso").to_str().unwrap()])
        .exits(1)
        .stderr_has("cannot read");
}
