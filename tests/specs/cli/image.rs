// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `burner image`, `burner size` and `burner fetch` specs, with a stand-in
//! genisoimage configured under `[tools]`.

use crate::prelude::*;

const FAKE_GENISOIMAGE: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) shift; out="$1";;
    -print-size) echo 512;;
  esac
  shift
done
[ -n "$out" ] && printf 'iso9660' > "$out"
exit 0
"#;

fn workspace() -> Workspace {
    let ws = Workspace::new();
    let tool = ws.script("bin/genisoimage", FAKE_GENISOIMAGE);
    let mirror = ws.path("mirror");
    ws.file("mirror/remote.txt", "from afar");
    ws.file(
        "config.toml",
        format!(
            "[tools]\ngenisoimage = \"{}\"\n\n[mirrors]\n\"http://example.com/\" = \"{}\"\n",
            tool.display(),
            mirror.display()
        ),
    );
    ws.file("docs/readme.txt", "read me");
    ws
}

#[test]
fn image_is_written() {
    let ws = workspace();
    let docs = ws.path("docs");
    let out = ws.path("out.iso");

    ws.burner()
        .args(&[
            "image",
            "--graft",
            &format!("{}=/docs", docs.display()),
            "--joliet",
            "--label",
            "Backup",
            "-o",
            out.to_str().unwrap(),
        ])
        .passes()
        .stdout_has(out.to_str().unwrap());

    assert_eq!(std::fs::read(&out).unwrap(), b"iso9660");
}

#[test]
fn size_is_printed_in_blocks() {
    let ws = workspace();
    ws.burner()
        .args(&["size", "--graft", ws.path("docs").to_str().unwrap()])
        .passes()
        .stdout_has("512 blocks (1.0 MiB)");
}

#[test]
fn remote_grafts_need_a_mirror() {
    let ws = workspace();
    ws.burner()
        .args(&["size", "--graft", "http://elsewhere.invalid/a.txt=/a.txt"])
        .exits(1)
        .stderr_has("not a local file");
}

#[test]
fn fetch_copies_through_the_mirror() {
    let ws = workspace();
    let dest = ws.path("copy.txt");

    ws.burner()
        .args(&["fetch", "http://example.com/remote.txt", dest.to_str().unwrap()])
        .passes()
        .stdout_has("9 B");

    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "from afar");
}
