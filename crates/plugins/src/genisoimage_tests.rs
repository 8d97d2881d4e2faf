// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use burner_core::tags::keys;
use burner_core::test_support::stream_track;
use burner_core::{GraftPoint, ImageFormat, Track, TrackRef};
use burner_engine::test_support::{scoped_context, scoped_context_with, test_session_with, ScopedContext};
use burner_engine::{Task, TaskOutput};
use std::ffi::OsStr;
use std::os::unix::fs::PermissionsExt;
use yare::parameterized;

#[parameterized(
    joliet = { "Joliet tree sort failed. The -joliet-long switch may help you.", ErrorKind::ImageJoliet },
    disk_full = { "genisoimage: No space left on device. cannot fwrite 32768*1", ErrorKind::DiskSpace },
    permission = { "genisoimage: Permission denied. Unable to open /root/x", ErrorKind::Permission },
    output = { "genisoimage: Unable to open disc image file '/ro/x.iso'", ErrorKind::Permission },
    too_large = { "File /a/b is larger than 4GiB-1. Value too large for defined data type", ErrorKind::ImageInvalid },
    charset = { "Unknown charset: koi9", ErrorKind::InputInvalid },
    missing = { "genisoimage: No such file or directory. Invalid node - '/gone'.", ErrorKind::FileNotFound },
    usage = { "Use genisoimage -help", ErrorKind::General },
)]
fn failures_are_classified(line: &str, kind: ErrorKind) {
    assert!(matches!(parse_stderr(line), IsoLine::Failure(k, _) if k == kind), "{line}");
}

#[parameterized(
    padded = { " 12.34% done, estimate finish Mon Jan  1 00:00:00 2026", 0.1234 },
    complete = { "100.00% done, estimate finish Mon Jan  1 00:00:00 2026", 1.0 },
    start = { "  0.52% done, estimate finish Mon Jan  1 00:00:09 2026", 0.0052 },
)]
fn progress_lines_give_a_fraction(line: &str, expected: f64) {
    let IsoLine::Progress(fraction) = parse_stderr(line) else {
        panic!("not progress: {line}");
    };
    assert!((fraction - expected).abs() < 1e-9, "{fraction}");
}

#[parameterized(
    banner = { "I: -input-charset not specified, using utf-8 (detected in locale settings)" },
    extents = { "Total extents scheduled to be written = 1234" },
    empty = { "" },
)]
fn other_lines_are_ignored(line: &str) {
    assert_eq!(parse_stderr(line), IsoLine::Other);
}

#[parameterized(
    bare = { "1234", Some(1234) },
    verbose = { "Total extents scheduled to be written = 88", Some(88) },
    padded = { "  42 ", Some(42) },
    text = { "genisoimage 1.1.11", None },
    empty = { "", None },
)]
fn size_lines(line: &str, expected: Option<u64>) {
    assert_eq!(parse_size(line), expected);
}

#[parameterized(
    plain = { "/docs/a.txt", "/docs/a.txt" },
    equals = { "/a=b", "/a\\=b" },
    backslash = { "/c\\d", "/c\\\\d" },
)]
fn graft_escaping(input: &str, expected: &str) {
    assert_eq!(escape_graft(input), expected);
}

fn data_track(dir: &std::path::Path, fs: FsFlags) -> TrackRef {
    let mut data = DataTrack::new(vec![
        GraftPoint::new(uri::from_path(&dir.join("a=1.txt")), "/a.txt"),
        GraftPoint::directory("/empty"),
    ])
    .excluded([uri::from_path(&dir.join("skip"))]);
    data.fs = fs;
    Track::data(data)
}

fn image_context(track: TrackRef, out: &std::path::Path) -> ScopedContext {
    let output = TaskOutput {
        track_type: TrackType::Image(ImageFormat::Bin),
        image: Some(out.to_path_buf()),
        ..TaskOutput::default()
    };
    scoped_context_with(Action::Image, output, vec![track], None)
}

fn args(argv: &Argv) -> Vec<String> {
    argv.args().iter().map(|a| a.to_string_lossy().into_owned()).collect()
}

fn value_after<'a>(args: &'a [String], flag: &str) -> &'a str {
    let at = args.iter().position(|a| a == flag).unwrap();
    &args[at + 1]
}

#[test]
fn image_argv_carries_every_requested_feature() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.iso");
    let mut s = image_context(data_track(dir.path(), FsFlags::JOLIET | FsFlags::ISO_LEVEL3 | FsFlags::UDF), &out);
    s.ctx.set_tag(keys::DATA_LABEL, "Backup").unwrap();

    let argv = Genisoimage::new().set_argv(&mut s.ctx).unwrap();

    assert_eq!(argv.program(), std::path::Path::new("genisoimage"));
    let args = args(&argv);
    assert_eq!(args[0], "-r");
    for flag in ["-J", "-joliet-long", "-udf", "-graft-points"] {
        assert!(args.iter().any(|a| a == flag), "{flag} missing from {args:?}");
    }
    assert!(!args.iter().any(|a| a == "-dvd-video"));
    assert_eq!(value_after(&args, "-iso-level"), "3");
    assert_eq!(value_after(&args, "-V"), "Backup");
    assert_eq!(value_after(&args, "-o"), out.display().to_string());
    assert!(!argv.contains("-print-size"));

    let excluded = std::fs::read_to_string(value_after(&args, "-exclude-list")).unwrap();
    assert_eq!(excluded, format!("{}\n", dir.path().join("skip").display()));
}

#[test]
fn path_list_escapes_and_grafts_empty_directories() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = image_context(data_track(dir.path(), FsFlags::ISO), &dir.path().join("out.iso"));

    let argv = Genisoimage::new().set_argv(&mut s.ctx).unwrap();
    let list = std::fs::read_to_string(value_after(&args(&argv), "-path-list")).unwrap();
    let lines: Vec<&str> = list.lines().collect();

    let source = escape_graft(&dir.path().join("a=1.txt").to_string_lossy());
    assert_eq!(lines[0], format!("/a.txt={source}"));
    let (dest, empty) = lines[1].split_once('=').unwrap();
    assert_eq!(dest, "/empty");
    assert_eq!(std::fs::read_dir(empty).unwrap().count(), 0);
}

#[test]
fn size_argv_prints_the_size_only() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = scoped_context(Action::Size, vec![data_track(dir.path(), FsFlags::ISO)]);

    let argv = Genisoimage::new().set_argv(&mut s.ctx).unwrap();

    assert!(argv.contains("-print-size"));
    assert!(argv.contains("-quiet"));
    assert!(!argv.contains("-o"));
}

#[test]
fn remote_graft_is_not_local() {
    let track = Track::data(DataTrack::new(vec![GraftPoint::new("ftp://host/a", "/a")]));
    let mut s = scoped_context(Action::Size, vec![track]);

    let err = Genisoimage::new().set_argv(&mut s.ctx).unwrap_err();
    assert_eq!(err.as_burner().map(|e| e.kind()), Some(ErrorKind::FileNotLocal));
}

#[test]
fn configured_tool_path_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = burner_engine::test_support::test_config(dir.path());
    config.tools.insert(NAME.into(), "/opt/cdrkit/genisoimage".into());
    assert_eq!(config.tool(NAME), std::path::Path::new("/opt/cdrkit/genisoimage"));
    assert_eq!(config.tool("wodim").as_os_str(), OsStr::new("wodim"));
}

#[test]
fn size_on_stdout_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = scoped_context(Action::Size, vec![data_track(dir.path(), FsFlags::ISO)]);
    let mut spec = Genisoimage::new();
    let mut deferred = DeferredError::default();

    spec.stdout_line(&mut s.ctx, "1234", &mut deferred).unwrap();
    spec.post(&mut s.ctx).unwrap();

    let size = s.ctx.session_output_size();
    assert_eq!((size.blocks, size.bytes), (1234, 1234 * 2048));
}

#[test]
fn missing_size_fails_the_job() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = scoped_context(Action::Size, vec![data_track(dir.path(), FsFlags::ISO)]);
    assert!(Genisoimage::new().post(&mut s.ctx).is_err());
}

#[test]
fn failure_lines_are_deferred() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = image_context(data_track(dir.path(), FsFlags::JOLIET), &dir.path().join("out.iso"));
    let mut deferred = DeferredError::default();

    Genisoimage::new()
        .stderr_line(&mut s.ctx, "Joliet tree sort failed. The -joliet-long switch may help you.", &mut deferred)
        .unwrap();

    assert_eq!(deferred.get().map(|e| e.kind()), Some(ErrorKind::ImageJoliet));
}

#[test]
fn progress_lines_reach_the_context() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = image_context(data_track(dir.path(), FsFlags::ISO), &dir.path().join("out.iso"));
    let mut deferred = DeferredError::default();
    let mut spec = Genisoimage::new();

    spec.stderr_line(&mut s.ctx, " 50.00% done, estimate finish soon", &mut deferred).unwrap();

    assert_eq!(s.progress(), [0.5]);
    assert!(deferred.get().is_none());
}

#[test]
fn only_data_tracks_activate() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = image_context(stream_track("/a.wav", 0, 1), &dir.path().join("out.iso"));
    assert_eq!(Genisoimage::new().activate(&mut s.ctx).unwrap(), Activation::Skip);

    let mut s = image_context(data_track(dir.path(), FsFlags::ISO), &dir.path().join("out.iso"));
    assert_eq!(Genisoimage::new().activate(&mut s.ctx).unwrap(), Activation::Ready);

    let mut s = scoped_context(Action::Record, vec![data_track(dir.path(), FsFlags::ISO)]);
    assert_eq!(Genisoimage::new().activate(&mut s.ctx).unwrap(), Activation::Skip);
}

#[tokio::test]
async fn size_task_runs_the_tool() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("fake-genisoimage");
    std::fs::write(&script, "#!/bin/sh\necho 'Total extents scheduled to be written = 321' >&2\necho 321\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    let track = data_track(dir.path(), FsFlags::ISO);
    let (mut session, _tmp) = test_session_with(vec![track], |mut config| {
        config.tools.insert(NAME.into(), script);
        config
    });

    session.run_task(Task::new(Action::Size).job(Genisoimage::job())).await.unwrap();

    assert_eq!(session.context().session_output_size().blocks, 321);
}
