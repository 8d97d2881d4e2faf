// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use burner_core::test_support::stream_track;
use burner_core::Track;
use burner_engine::test_support::test_session;
use burner_engine::{SessionEvent, Task};
use std::io::Cursor;
use yare::parameterized;

const SECOND: u64 = 1_000_000_000;

fn wav(channels: u16, rate: u32, bits: u16, extra: &[u8], samples: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(extra);
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&rate.to_le_bytes());
    out.extend_from_slice(&(rate * 4).to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(samples.len() as u32).to_le_bytes());
    out.extend_from_slice(samples);
    out
}

fn cd_wav(samples: &[u8]) -> Vec<u8> {
    wav(2, 44_100, 16, &[], samples)
}

#[test]
fn header_locates_the_samples() {
    let bytes = cd_wav(&[1, 2, 3, 4]);
    let layout = read_wav_header(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(layout, PcmLayout { offset: 44, len: 4, big_endian: false });
}

#[test]
fn unknown_chunks_are_skipped() {
    let mut list = b"LIST".to_vec();
    list.extend_from_slice(&3u32.to_le_bytes());
    list.extend_from_slice(&[0, 0, 0, 0]);
    let bytes = wav(2, 44_100, 16, &list, &[9; 8]);
    let layout = read_wav_header(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(layout.offset, 56);
    assert_eq!(layout.len, 8);
}

#[test]
fn oversized_format_chunk_is_skipped_not_buffered() {
    let mut bytes = cd_wav(&[5; 4]);
    // Announce a huge fmt chunk whose extension runs to the end of the file
    bytes[16..20].copy_from_slice(&u32::MAX.to_le_bytes());
    let err = read_wav_header(&mut Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, WavError::MissingData), "{err:?}");
}

#[test]
fn format_extension_is_skipped() {
    let mut bytes = cd_wav(&[7; 4]);
    bytes[16..20].copy_from_slice(&18u32.to_le_bytes());
    bytes.splice(36..36, [0u8, 0]);
    let layout = read_wav_header(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(layout, PcmLayout { offset: 46, len: 4, big_endian: false });
}

#[test]
fn announced_length_is_clamped_to_the_file() {
    let mut bytes = cd_wav(&[0; 8]);
    bytes.truncate(48);
    let layout = read_wav_header(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(layout.len, 4);
}

#[parameterized(
    mono = { 1, 44_100, 16 },
    wrong_rate = { 2, 48_000, 16 },
    wrong_depth = { 2, 44_100, 24 },
)]
fn non_cd_layouts_are_rejected(channels: u16, rate: u32, bits: u16) {
    let bytes = wav(channels, rate, bits, &[], &[0; 4]);
    let err = read_wav_header(&mut Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, WavError::Unsupported { .. }), "{err}");
}

#[test]
fn non_riff_input_is_rejected() {
    let err = read_wav_header(&mut Cursor::new(b"ID3\x04 not a wave file".to_vec())).unwrap_err();
    assert!(matches!(err, WavError::NotWave));
    let job: JobError = err.into();
    assert_eq!(job.as_burner().map(|e| e.kind()), Some(ErrorKind::InputInvalid));
}

#[test]
fn truncated_header_is_invalid_input() {
    let err = read_wav_header(&mut Cursor::new(b"RIFF".to_vec())).unwrap_err();
    let job: JobError = err.into();
    assert_eq!(job.as_burner().map(|e| e.kind()), Some(ErrorKind::InputInvalid));
}

#[parameterized(
    whole = { 0, None, 1000, (0, 1000) },
    clamped_end = { 0, Some(10 * SECOND), 1000, (0, 1000) },
    one_second = { SECOND, Some(2 * SECOND), 1_000_000, (176_400, 352_800) },
    frame_aligned = { SECOND / 3, None, 1_000_000, (58_796, 1_000_000) },
)]
fn ranges_follow_the_boundaries(start: u64, end: Option<u64>, len: u64, expected: (u64, u64)) {
    let mut stream = StreamTrack::new("/a.wav", StreamFormat::UNDEFINED).start(start);
    stream.end = end;
    let layout = PcmLayout { offset: 44, len, big_endian: false };
    assert_eq!(byte_range(&stream, &layout).unwrap(), expected);
}

#[test]
fn empty_range_is_invalid() {
    let stream = StreamTrack::new("/a.wav", StreamFormat::UNDEFINED).start(10 * SECOND);
    let layout = PcmLayout { offset: 0, len: 100, big_endian: false };
    assert!(byte_range(&stream, &layout).is_err());
}

#[parameterized(
    zero = { 0, 0 },
    one = { 1, 2352 },
    exact = { 2352, 2352 },
    over = { 2353, 4704 },
)]
fn padding_rounds_up_to_sectors(bytes: u64, expected: u64) {
    assert_eq!(sector_padded(bytes), expected);
}

fn audio_task(action: Action, format: StreamFormat) -> Task {
    Task::new(action).output_type(TrackType::Stream(format)).job(Transcode::new())
}

#[tokio::test]
async fn wav_is_extracted_as_big_endian_sectors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.wav");
    std::fs::write(&path, cd_wav(&[1, 2, 3, 4, 5, 6, 7, 8])).unwrap();
    let track = Track::stream(StreamTrack::new(path.display().to_string(), StreamFormat::UNDEFINED));
    let (mut session, _tmp) = test_session(vec![track.clone()]);

    session.run_task(audio_task(Action::Image, StreamFormat::RAW)).await.unwrap();

    let produced = session.context().produced_tracks();
    assert_eq!(produced.len(), 1);
    let stream = produced[0].as_stream().unwrap();
    assert_eq!(stream.format, StreamFormat::RAW);
    assert_eq!(stream.end, Some(bytes_to_duration(2352)));
    let data = std::fs::read(uri::to_path(&stream.source).unwrap()).unwrap();
    assert_eq!(data.len(), 2352);
    assert_eq!(&data[..8], &[2, 1, 4, 3, 6, 5, 8, 7]);
    assert!(data[8..].iter().all(|b| *b == 0));
}

#[tokio::test]
async fn little_endian_output_keeps_the_byte_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.raw");
    std::fs::write(&path, [1u8, 2, 3, 4]).unwrap();
    let track = Track::stream(StreamTrack::new(path.display().to_string(), StreamFormat::RAW_LITTLE_ENDIAN));
    let (mut session, _tmp) = test_session(vec![track]);

    session.run_task(audio_task(Action::Image, StreamFormat::RAW_LITTLE_ENDIAN)).await.unwrap();

    let stream = session.context().produced_tracks()[0].as_stream().cloned().unwrap();
    let data = std::fs::read(uri::to_path(&stream.source).unwrap()).unwrap();
    assert_eq!(&data[..4], &[1, 2, 3, 4]);
}

#[tokio::test]
async fn size_action_reports_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.wav");
    std::fs::write(&path, cd_wav(&vec![0u8; 3000])).unwrap();
    let track = Track::stream(StreamTrack::new(path.display().to_string(), StreamFormat::UNDEFINED));
    let (mut session, _tmp) = test_session(vec![track]);

    session.run_task(audio_task(Action::Size, StreamFormat::RAW)).await.unwrap();

    let size = session.context().session_output_size();
    assert_eq!(size.blocks, 2);
    assert_eq!(size.bytes, 4704);
    assert!(session.context().produced_tracks().is_empty());
}

#[tokio::test]
async fn identical_tracks_reuse_the_first_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.wav");
    std::fs::write(&path, cd_wav(&vec![7u8; 400])).unwrap();
    let source = path.display().to_string();
    let tracks = vec![
        Track::stream(StreamTrack::new(source.clone(), StreamFormat::UNDEFINED)),
        Track::stream(StreamTrack::new(source, StreamFormat::UNDEFINED)),
    ];
    let (mut session, _tmp) = test_session(tracks);
    let mut events = session.subscribe();

    session.run_task(audio_task(Action::Image, StreamFormat::RAW)).await.unwrap();

    let produced = session.context().produced_tracks();
    assert_eq!(produced.len(), 2);
    assert_ne!(produced[0].id(), produced[1].id());
    assert_eq!(produced[0].as_stream(), produced[1].as_stream());
    let mut added = 0;
    while let Ok(event) = events.try_recv() {
        added += usize::from(matches!(event, SessionEvent::TrackAdded(_)));
    }
    assert_eq!(added, 2);
}

#[tokio::test]
async fn different_boundaries_are_extracted_separately() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.raw");
    std::fs::write(&path, vec![0u8; 2 * 176_400]).unwrap();
    let source = path.display().to_string();
    let mut first = stream_track(&source, 0, 1).as_stream().cloned().unwrap();
    first.format = StreamFormat::RAW;
    let mut second = stream_track(&source, 1, 2).as_stream().cloned().unwrap();
    second.format = StreamFormat::RAW;
    let (mut session, _tmp) = test_session(vec![Track::stream(first), Track::stream(second)]);

    session.run_task(audio_task(Action::Image, StreamFormat::RAW)).await.unwrap();

    let produced = session.context().produced_tracks();
    let a = produced[0].as_stream().unwrap();
    let b = produced[1].as_stream().unwrap();
    assert_ne!(a.source, b.source);
}

#[tokio::test]
async fn non_stream_tracks_skip_the_job() {
    let track = Track::data(burner_core::DataTrack::new(vec![]));
    let (mut session, _tmp) = test_session(vec![track]);
    session.run_task(audio_task(Action::Image, StreamFormat::RAW)).await.unwrap();
    assert!(session.context().produced_tracks().is_empty());
}
