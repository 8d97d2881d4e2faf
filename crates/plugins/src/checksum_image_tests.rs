// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use burner_core::test_support::{image_track, stream_track};
use burner_core::{DataTrack, GraftPoint, Track};
use burner_engine::test_support::test_session;
use burner_engine::{SessionEvent, Task};

const MD5_EMPTY: &str = "d41d8cd98f00b204e9800998ecf8427e";
const MD5_ABC: &str = "900150983cd24fb0d6963f7d28e17f72";

fn image_with(dir: &std::path::Path, content: &[u8]) -> TrackRef {
    let path = dir.join("disc.iso");
    std::fs::write(&path, content).unwrap();
    image_track(&path)
}

#[tokio::test]
async fn zero_length_image_gets_a_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let track = image_with(dir.path(), b"");
    let (mut session, _tmp) = test_session(vec![track.clone()]);

    session.run_task(Task::new(Action::Image).job(ChecksumImage::new())).await.unwrap();

    assert_eq!(track.checksum().map(|c| c.value().to_string()).as_deref(), Some(MD5_EMPTY));
    assert_eq!(session.context().done_tracks().len(), 1);
}

#[tokio::test]
async fn configured_algorithm_can_be_overridden() {
    let dir = tempfile::tempdir().unwrap();
    let track = image_with(dir.path(), b"abc");
    let (mut session, _tmp) = test_session(vec![track.clone()]);

    session
        .run_task(Task::new(Action::Record).job(ChecksumImage::with_type(ChecksumType::Sha1)))
        .await
        .unwrap();

    let checksum = track.checksum().unwrap();
    assert_eq!(checksum.kind(), ChecksumType::Sha1);
    assert_eq!(checksum.value(), "a9993e364706816aba3e25717850c26c9cd0d89d");
}

#[tokio::test]
async fn every_stream_track_is_hashed() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.raw");
    let b = dir.path().join("b.raw");
    std::fs::write(&a, b"abc").unwrap();
    std::fs::write(&b, b"").unwrap();
    let tracks = vec![
        stream_track(&a.display().to_string(), 0, 1),
        stream_track(&uri::from_path(&b), 0, 1),
    ];
    let (mut session, _tmp) = test_session(tracks.clone());

    session.run_task(Task::new(Action::Image).job(ChecksumImage::new())).await.unwrap();

    let values: Vec<String> = tracks.iter().filter_map(|t| t.checksum()).map(|c| c.value().to_string()).collect();
    assert_eq!(values, [MD5_ABC, MD5_EMPTY]);
}

#[tokio::test]
async fn verify_accepts_a_matching_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let track = image_with(dir.path(), b"abc");
    track.set_checksum(Checksum::new(ChecksumType::Md5, MD5_ABC).unwrap());
    let (mut session, _tmp) = test_session(vec![track]);

    session.run_task(Task::new(Action::Checksum).job(ChecksumImage::new())).await.unwrap();
}

#[tokio::test]
async fn verify_rejects_a_different_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let track = image_with(dir.path(), b"abd");
    track.set_checksum(Checksum::new(ChecksumType::Md5, MD5_ABC).unwrap());
    let (mut session, _tmp) = test_session(vec![track]);

    let err = session.run_task(Task::new(Action::Checksum).job(ChecksumImage::new())).await.unwrap_err();
    assert_eq!(err.as_burner().map(|e| e.kind()), Some(ErrorKind::BadChecksum));
}

#[tokio::test]
async fn verify_without_reference_warns_and_attaches() {
    let dir = tempfile::tempdir().unwrap();
    let track = image_with(dir.path(), b"abc");
    let (mut session, _tmp) = test_session(vec![track.clone()]);
    let mut events = session.subscribe();

    session.run_task(Task::new(Action::Checksum).job(ChecksumImage::new())).await.unwrap();

    assert_eq!(track.checksum().map(|c| c.value().to_string()).as_deref(), Some(MD5_ABC));
    let mut warned = false;
    while let Ok(event) = events.try_recv() {
        warned |= matches!(event, SessionEvent::Warning(w) if w.kind() == ErrorKind::ChecksumWarning);
    }
    assert!(warned);
}

#[tokio::test]
async fn data_tracks_are_skipped() {
    let track = Track::data(DataTrack::new(vec![GraftPoint::directory("/empty")]));
    let (mut session, _tmp) = test_session(vec![track.clone()]);

    session.run_task(Task::new(Action::Image).job(ChecksumImage::new())).await.unwrap();
    assert!(track.checksum().is_none());
}

#[tokio::test]
async fn missing_file_is_reported() {
    let track = image_track(std::path::Path::new("/nonexistent/disc.iso"));
    let (mut session, _tmp) = test_session(vec![track]);

    let err = session.run_task(Task::new(Action::Image).job(ChecksumImage::new())).await.unwrap_err();
    assert_eq!(err.as_burner().map(|e| e.kind()), Some(ErrorKind::FileNotFound));
}

#[tokio::test]
async fn remote_stream_is_not_local() {
    let track = stream_track("http://example.com/a.raw", 0, 1);
    let (mut session, _tmp) = test_session(vec![track]);

    let err = session.run_task(Task::new(Action::Image).job(ChecksumImage::new())).await.unwrap_err();
    assert_eq!(err.as_burner().map(|e| e.kind()), Some(ErrorKind::FileNotLocal));
}

#[test]
fn stop_is_idempotent() {
    let mut s = burner_engine::test_support::scoped_context(Action::Image, vec![]);
    let mut job = ChecksumImage::new();
    job.stop(&mut s.ctx).unwrap();
    job.stop(&mut s.ctx).unwrap();
}
