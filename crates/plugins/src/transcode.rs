// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Extracts CD audio from PCM sources.
//!
//! Sources are WAV files (44.1 kHz, 16-bit, stereo) or headerless raw PCM
//! marked by the stream format flags. The `[start, end)` range of each
//! track is cut out on 4-byte frame boundaries, padded to whole sectors
//! and written as raw CD audio in the byte order the task asks for.

use burner_core::track::stream::{bytes_to_duration, duration_to_bytes, AUDIO_SECTOR_SIZE};
use burner_core::{
    uri, Action, BurnAction, ErrorKind, StreamFormat, StreamTrack, TrackKind, TrackRef, TrackType,
};
use burner_engine::{Activation, Job, JobContext, JobError, Started, WorkerOutcome, WorkerScope, WorkerThread};
use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const NAME: &str = "transcode";

const CHUNK: usize = 64 * 1024;
/// One stereo 16-bit frame
const FRAME: u64 = 4;

#[derive(Debug, Error)]
pub enum WavError {
    #[error("not a RIFF/WAVE file")]
    NotWave,

    #[error("no fmt chunk before the audio data")]
    MissingFormat,

    #[error("no data chunk")]
    MissingData,

    #[error("unsupported PCM layout: format {format}, {channels} channels, {rate} Hz, {bits} bits")]
    Unsupported { format: u16, channels: u16, rate: u32, bits: u16 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<WavError> for JobError {
    fn from(err: WavError) -> Self {
        match err {
            WavError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                JobError::new(ErrorKind::InputInvalid, "truncated WAV header")
            }
            WavError::Io(e) => JobError::io("cannot read audio source", &e),
            other => JobError::new(ErrorKind::InputInvalid, other.to_string()),
        }
    }
}

/// Where the PCM samples sit in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmLayout {
    pub offset: u64,
    pub len: u64,
    pub big_endian: bool,
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Walk the RIFF chunks of a WAV file up to its data chunk. Only CD audio
/// PCM is accepted. The data length is clamped to what the file holds.
pub fn read_wav_header<R: Read + Seek>(reader: &mut R) -> Result<PcmLayout, WavError> {
    let mut riff = [0u8; 12];
    reader.read_exact(&mut riff)?;
    if &riff[0..4] != b"RIFF" || &riff[8..12] != b"WAVE" {
        return Err(WavError::NotWave);
    }

    let mut format_seen = false;
    loop {
        let mut header = [0u8; 8];
        match reader.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Err(WavError::MissingData),
            Err(e) => return Err(e.into()),
        }
        let size = u64::from(read_u32(&header, 4));
        match &header[0..4] {
            b"fmt " => {
                if size < 16 {
                    return Err(WavError::MissingFormat);
                }
                let mut fmt = [0u8; 16];
                reader.read_exact(&mut fmt)?;
                let format = read_u16(&fmt, 0);
                let channels = read_u16(&fmt, 2);
                let rate = read_u32(&fmt, 4);
                let bits = read_u16(&fmt, 14);
                let pcm = format == 1 || format == 0xFFFE;
                if !pcm || channels != 2 || rate != 44_100 || bits != 16 {
                    return Err(WavError::Unsupported { format, channels, rate, bits });
                }
                // Extension bytes and the pad byte of odd sizes
                reader.seek(SeekFrom::Current((size - 16 + size % 2) as i64))?;
                format_seen = true;
            }
            b"data" => {
                if !format_seen {
                    return Err(WavError::MissingFormat);
                }
                let offset = reader.stream_position()?;
                let end = reader.seek(SeekFrom::End(0))?;
                let len = size.min(end.saturating_sub(offset));
                return Ok(PcmLayout { offset, len, big_endian: false });
            }
            _ => {
                reader.seek(SeekFrom::Current((size + size % 2) as i64))?;
            }
        }
    }
}

/// Layout of `path` given the declared stream format.
fn probe(path: &Path, format: StreamFormat) -> Result<PcmLayout, JobError> {
    let mut file = File::open(path).map_err(|e| JobError::io(format!("cannot open {}", path.display()), &e))?;
    if format.intersects(StreamFormat::RAW | StreamFormat::RAW_LITTLE_ENDIAN) {
        let len = file.metadata().map_err(|e| JobError::io(format!("cannot stat {}", path.display()), &e))?.len();
        let big_endian = format.contains(StreamFormat::RAW) && !format.contains(StreamFormat::RAW_LITTLE_ENDIAN);
        return Ok(PcmLayout { offset: 0, len, big_endian });
    }
    Ok(read_wav_header(&mut file)?)
}

fn frame_floor(bytes: u64) -> u64 {
    bytes - bytes % FRAME
}

/// Byte range of `stream` inside a source laid out as `layout`, relative to
/// the first sample.
pub fn byte_range(stream: &StreamTrack, layout: &PcmLayout) -> Result<(u64, u64), JobError> {
    let start = frame_floor(duration_to_bytes(stream.start));
    let end = stream.end.map(|end| frame_floor(duration_to_bytes(end))).unwrap_or(layout.len).min(layout.len);
    if start >= end {
        return Err(JobError::new(
            ErrorKind::InputInvalid,
            format!("\"{}\" has no audio between the requested boundaries", stream.source),
        ));
    }
    Ok((start, end))
}

/// `bytes` rounded up to whole audio sectors.
pub fn sector_padded(bytes: u64) -> u64 {
    bytes.div_ceil(AUDIO_SECTOR_SIZE) * AUDIO_SECTOR_SIZE
}

fn output_big_endian(output: TrackType) -> bool {
    match output {
        TrackType::Stream(format) => {
            format.contains(StreamFormat::RAW) && !format.contains(StreamFormat::RAW_LITTLE_ENDIAN)
        }
        _ => false,
    }
}

/// Read until `buf` is full or the reader is exhausted.
fn fill(reader: &mut impl Read, buf: &mut [u8], scope: &WorkerScope) -> Result<usize, JobError> {
    let mut filled = 0;
    while filled < buf.len() {
        scope.check()?;
        let read = scope.retry_io(|| reader.read(&mut buf[filled..]))?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}

struct Extraction {
    source: PathBuf,
    dest: PathBuf,
    offset: u64,
    len: u64,
    swap: bool,
}

impl Extraction {
    /// Copy the range, then zero-pad to a sector boundary. Returns the
    /// bytes written.
    fn run(self, scope: &WorkerScope) -> Result<u64, JobError> {
        let padded = sector_padded(self.len);
        scope.set_total(padded);
        let mut input = File::open(&self.source)
            .map_err(|e| JobError::io(format!("cannot open {}", self.source.display()), &e))?;
        input
            .seek(SeekFrom::Start(self.offset))
            .map_err(|e| JobError::io(format!("cannot seek {}", self.source.display()), &e))?;
        let mut input = input.take(self.len);
        let file = File::create(&self.dest)
            .map_err(|e| JobError::io(format!("cannot create {}", self.dest.display()), &e))?;
        let mut output = BufWriter::new(file);
        let write_err = |e: io::Error| JobError::io(format!("cannot write {}", self.dest.display()), &e);

        let mut buf = vec![0u8; CHUNK];
        let mut written = 0;
        loop {
            let read = fill(&mut input, &mut buf, scope)?;
            if read == 0 {
                break;
            }
            let chunk = &mut buf[..read];
            if self.swap {
                for pair in chunk.chunks_exact_mut(2) {
                    pair.swap(0, 1);
                }
            }
            output.write_all(chunk).map_err(write_err)?;
            written += read as u64;
            scope.add_done(read as u64);
        }
        // A source shorter than announced still yields whole sectors.
        let padding = sector_padded(written) - written;
        if padding > 0 {
            output.write_all(&vec![0u8; padding as usize]).map_err(write_err)?;
            scope.add_done(padding);
        }
        output.flush().map_err(write_err)?;
        Ok(written + padding)
    }
}

#[derive(Default)]
pub struct Transcode {
    worker: Option<WorkerThread>,
}

impl Transcode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output of an earlier track with the same source and boundaries.
    fn sibling_output(ctx: &JobContext, stream: &StreamTrack) -> Option<TrackRef> {
        ctx.tracks()[..ctx.current_index()]
            .iter()
            .filter(|t| t.as_stream().is_some_and(|s| s.is_sibling(stream)))
            .find_map(|t| ctx.produced_for(t.id()).cloned())
    }
}

fn source_path(stream: &StreamTrack) -> Result<PathBuf, JobError> {
    uri::to_path(&stream.source).ok_or_else(|| {
        JobError::new(ErrorKind::FileNotLocal, format!("\"{}\" is not a local file", stream.source))
    })
}

impl Job for Transcode {
    fn name(&self) -> &str {
        NAME
    }

    fn activate(&mut self, ctx: &mut JobContext) -> Result<Activation, JobError> {
        if !matches!(ctx.action(), Action::Image | Action::Size) {
            return Ok(Activation::Skip);
        }
        if !ctx.tracks().iter().any(|t| t.as_stream().is_some()) {
            return Ok(Activation::Skip);
        }
        Ok(Activation::Ready)
    }

    fn start(&mut self, ctx: &mut JobContext) -> Result<Started, JobError> {
        if self.worker.is_some() {
            return Ok(Started::Running);
        }
        let track = ctx.current_track()?;
        let Some(stream) = track.as_stream().cloned() else {
            return burner_engine::not_supported(NAME, "transcoding a non stream track");
        };

        if ctx.action() == Action::Image {
            if let Some(output) = Self::sibling_output(ctx, &stream) {
                ctx.log(&format!("reusing the output of an identical track for {}", stream.source));
                ctx.add_track(track.derive(output.kind().clone()))?;
                ctx.finished_track()?;
                return Ok(Started::Done);
            }
        }

        let source = source_path(&stream)?;
        let layout = probe(&source, stream.format)?;
        let (start, end) = byte_range(&stream, &layout)?;

        if ctx.action() == Action::Size {
            let bytes = sector_padded(end - start);
            ctx.set_output_size_for_current_track(bytes / AUDIO_SECTOR_SIZE, bytes)?;
            ctx.finished_track()?;
            return Ok(Started::Done);
        }

        let output_type = ctx.output_type();
        let out_format = match output_type {
            TrackType::Stream(format) => format,
            _ => return burner_engine::not_supported(NAME, "transcoding to a non stream output"),
        };
        let dest = ctx.audio_output()?;
        let extraction = Extraction {
            source,
            dest: dest.clone(),
            offset: layout.offset + start,
            len: end - start,
            swap: layout.big_endian != output_big_endian(output_type),
        };
        ctx.set_current_action(BurnAction::Transcoding, None, false)?;
        tracing::info!(job = NAME, source = %stream.source, start, end, dest = %dest.display(), "extracting audio");

        let worker = WorkerThread::spawn(NAME, ctx.link()?, move |scope| {
            let written = match extraction.run(scope) {
                Ok(written) => written,
                Err(e) => return WorkerOutcome::from_error(e, NAME),
            };
            WorkerOutcome::complete(move |ctx| {
                let output = StreamTrack::new(uri::from_path(&dest), out_format)
                    .end(bytes_to_duration(written))
                    .gap(stream.gap);
                ctx.add_track(track.derive(TrackKind::Stream(output)))?;
                ctx.finished_track()
            })
        })?;
        self.worker = Some(worker);
        Ok(Started::Running)
    }

    fn clock_tick(&mut self, ctx: &mut JobContext) -> Result<(), JobError> {
        let Some(worker) = &self.worker else {
            return Ok(());
        };
        let progress = worker.progress();
        if progress.total() > 0 {
            ctx.set_progress(progress.done() as f64 / progress.total() as f64)?;
        }
        Ok(())
    }

    fn stop(&mut self, _ctx: &mut JobContext) -> Result<(), JobError> {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "transcode_tests.rs"]
mod tests;
