// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{scoped_context, scoped_context_with, test_config, Outcome};
use burner_core::test_support::{image_track, stream_track};
use burner_core::{ErrorKind, MediumStatus, StaticDrive, StatusResult, StreamFormat};

#[test]
fn mutators_outside_scope_are_not_ready() {
    let tmp = tempfile::tempdir().unwrap();
    let mut ctx = JobContext::new(Arc::new(test_config(tmp.path())));
    assert_eq!(ctx.finished_track(), Err(JobError::NotReady("finished track")));
    assert!(matches!(ctx.error(BurnerError::general("x")), Err(JobError::NotReady(_))));
    assert!(matches!(ctx.set_progress(0.5), Err(JobError::NotReady(_))));
    assert!(matches!(ctx.input_fd(), Err(JobError::NotReady(_))));
    assert!(matches!(ctx.link(), Err(JobError::NotReady(_))));
}

#[test]
fn finished_track_with_more_tracks_is_next_track() {
    let mut s = scoped_context(
        Action::Image,
        vec![stream_track("/a.wav", 0, 1), stream_track("/b.wav", 0, 1)],
    );
    s.ctx.finished_track().unwrap();
    assert_eq!(s.outcome(), Outcome::NextTrack);

    s.ctx.advance_track();
    s.ctx.finished_track().unwrap();
    assert_eq!(s.outcome(), Outcome::Finished);
    assert_eq!(s.ctx.done_tracks().len(), 1);
}

#[test]
fn first_error_wins() {
    let mut s = scoped_context(Action::Record, vec![]);
    s.ctx.error(BurnerError::new(ErrorKind::MediumSpace, "no room")).unwrap();
    s.ctx.error(BurnerError::general("later")).unwrap();
    s.ctx.finished_session().unwrap();
    match s.outcome() {
        Outcome::Error(e) => assert_eq!(e.kind(), ErrorKind::MediumSpace),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn warnings_do_not_stop_the_task() {
    let mut s = scoped_context(Action::Checksum, vec![]);
    s.ctx.error(BurnerError::new(ErrorKind::ChecksumWarning, "could not verify")).unwrap();
    assert_eq!(s.outcome(), Outcome::Pending);
    assert!(s
        .events()
        .iter()
        .any(|e| matches!(e, SessionEvent::Warning(w) if w.kind() == ErrorKind::ChecksumWarning)));
}

#[test]
fn progress_events_in_call_order() {
    let mut s = scoped_context(Action::Image, vec![]);
    s.ctx.set_progress(0.5).unwrap();
    s.ctx.set_progress(1.0).unwrap();
    assert_eq!(s.progress(), vec![0.5, 1.0]);
    assert_eq!(s.ctx.status().result(), StatusResult::NotReady);
    assert_eq!(s.ctx.status().progress(), Some(1.0));
}

#[test]
fn progress_not_supported_in_size_action() {
    let mut s = scoped_context(Action::Size, vec![]);
    assert!(matches!(s.ctx.set_progress(0.5), Err(JobError::NotSupported(_))));
    s.ctx.set_output_size_for_current_track(10, 20480).unwrap();
    assert_eq!(s.ctx.session_output_size(), TrackSize { blocks: 10, bytes: 20480 });
}

#[test]
fn output_size_needs_size_action() {
    let mut s = scoped_context(Action::Image, vec![]);
    assert!(matches!(s.ctx.set_output_size_for_current_track(1, 2048), Err(JobError::NotSupported(_))));
}

#[test]
fn current_action_dedup_unless_forced() {
    let mut s = scoped_context(Action::Record, vec![]);
    s.ctx.set_current_action(BurnAction::Recording, None, false).unwrap();
    s.ctx.set_current_action(BurnAction::Recording, None, false).unwrap();
    s.ctx.set_current_action(BurnAction::Recording, None, true).unwrap();
    let actions = s.events().into_iter().filter(|e| matches!(e, SessionEvent::Action { .. })).count();
    assert_eq!(actions, 2);
    assert_eq!(s.ctx.status().current_action(), Some(BurnAction::Recording.label()));
}

#[test]
fn add_track_records_producer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.iso");
    std::fs::write(&path, vec![0u8; 4096]).unwrap();
    let input = stream_track("/a.wav", 0, 2);
    let mut s = scoped_context(Action::Image, vec![input.clone()]);
    let output = image_track(&path);
    s.ctx.add_track(output.clone()).unwrap();

    assert_eq!(s.ctx.produced_for(input.id()).map(|t| t.id()), Some(output.id()));
    assert!(s.events().iter().any(|e| matches!(e, SessionEvent::TrackAdded(t) if t.id() == output.id())));

    // Products of one task are the inputs of the next
    s.ctx.begin_task(Action::Record, TaskOutput::default());
    assert_eq!(s.ctx.tracks().len(), 1);
    assert_eq!(s.ctx.tracks()[0].id(), output.id());
}

#[test]
fn image_output_is_stable_temp_file() {
    let output = TaskOutput { track_type: TrackType::Image(ImageFormat::Bin), ..TaskOutput::default() };
    let mut s = scoped_context_with(Action::Image, output, vec![], None);
    let (image, toc) = s.ctx.image_output().unwrap();
    assert!(image.to_string_lossy().ends_with(".iso"));
    assert_eq!(toc, None);
    assert_eq!(s.ctx.image_output().unwrap().0, image);
}

#[test]
fn image_output_with_toc_uses_configured_path() {
    let output = TaskOutput {
        track_type: TrackType::Image(ImageFormat::Cue),
        image: Some("/out/disc.bin".into()),
        ..TaskOutput::default()
    };
    let mut s = scoped_context_with(Action::Image, output, vec![], None);
    assert_eq!(
        s.ctx.image_output().unwrap(),
        (PathBuf::from("/out/disc.bin"), Some(PathBuf::from("/out/disc.toc")))
    );
}

#[test]
fn audio_output_per_track() {
    let output = TaskOutput {
        track_type: TrackType::Stream(StreamFormat::RAW),
        dir: Some("/music".into()),
        ..TaskOutput::default()
    };
    let tracks = vec![stream_track("/a.wav", 0, 1), stream_track("/b.wav", 0, 1)];
    let mut s = scoped_context_with(Action::Image, output, tracks, None);
    assert_eq!(s.ctx.audio_output().unwrap(), PathBuf::from("/music/track01.raw"));
    s.ctx.advance_track();
    assert_eq!(s.ctx.audio_output().unwrap(), PathBuf::from("/music/track02.raw"));
}

#[test]
fn medium_accessors_need_a_target() {
    let s = scoped_context(Action::Record, vec![]);
    assert!(matches!(s.ctx.device(), Err(JobError::NotSupported(_))));
    assert!(matches!(s.ctx.next_writable_address(), Err(JobError::NotSupported(_))));
}

#[test]
fn medium_accessors_read_the_drive() {
    let medium = MediumInfo {
        status: MediumStatus::CD | MediumStatus::WRITABLE | MediumStatus::APPENDABLE,
        capacity_blocks: 359_847,
        last_session_address: Some(0),
        next_writable_address: Some(11_702),
        tracks: vec![],
    };
    let drive: Arc<dyn Drive> = Arc::new(
        StaticDrive::new("/dev/sr0", Some(medium))
            .with_bus_target_lun("1,0,0")
            .with_max_rate(176_400 * 24),
    );
    let s = scoped_context_with(Action::Record, TaskOutput::default(), vec![], Some(drive));
    assert_eq!(s.ctx.device().unwrap(), PathBuf::from("/dev/sr0"));
    assert_eq!(s.ctx.bus_target_lun().unwrap(), "1,0,0");
    assert_eq!(s.ctx.next_writable_address().unwrap(), 11_702);
    assert_eq!(s.ctx.last_session_address().unwrap(), 0);
    assert_eq!(s.ctx.max_speed().unwrap(), 24);
    // No configured speed: the maximum
    assert_eq!(s.ctx.speed().unwrap(), 24);
}

#[test]
fn empty_drive_is_medium_none() {
    let drive: Arc<dyn Drive> = Arc::new(StaticDrive::new("/dev/sr0", None));
    let s = scoped_context_with(Action::Record, TaskOutput::default(), vec![], Some(drive));
    let err = s.ctx.medium().unwrap_err();
    assert_eq!(err.as_burner().map(|e| e.kind()), Some(ErrorKind::MediumNone));
}

#[test]
fn tags_and_labels() {
    let mut s = scoped_context(Action::Image, vec![]);
    assert_eq!(s.ctx.data_label(), None);
    s.ctx.set_tag(keys::DATA_LABEL, "BACKUP").unwrap();
    assert_eq!(s.ctx.data_label().as_deref(), Some("BACKUP"));
    assert_eq!(s.ctx.tag(keys::DATA_LABEL), Some(TagValue::Str("BACKUP".into())));
}

#[test]
fn temp_allocations_are_removed_on_cleanup() {
    let mut s = scoped_context(Action::Image, vec![]);
    let file = s.ctx.tmp_file(Some(".raw")).unwrap();
    let dir = s.ctx.tmp_dir().unwrap();
    assert!(file.exists() && dir.exists());
    s.ctx.cleanup();
    assert!(!file.exists() && !dir.exists());
}

#[test]
fn log_goes_to_session_log() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = test_config(tmp.path());
    config.session_log = Some(tmp.path().join("session.log"));
    let mut ctx = JobContext::new(Arc::new(config));
    ctx.log("outside any job");
    let text = std::fs::read_to_string(tmp.path().join("session.log")).unwrap();
    assert!(text.contains("[session] outside any job"));
}
