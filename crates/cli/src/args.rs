// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Value parsers for the track and graft arguments.

use burner_core::{uri, GraftPoint, StreamFormat, StreamTrack};
use std::path::Path;
use thiserror::Error;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    #[error("empty path")]
    EmptyPath,
    #[error("invalid time '{0}' (expected SECONDS or MM:SS, with optional fraction)")]
    InvalidTime(String),
    #[error("invalid range '{0}': the end must come after the start")]
    InvalidRange(String),
    #[error("cannot name a graft point for '{0}'; use SRC=DEST")]
    Unnamed(String),
}

/// URI for a command-line source: URIs are kept, paths made absolute.
pub fn source_uri(source: &str) -> Result<String, ArgError> {
    if source.is_empty() {
        return Err(ArgError::EmptyPath);
    }
    if uri::scheme(source).is_some() {
        return Ok(source.to_string());
    }
    let path = Path::new(source);
    if path.is_absolute() {
        return Ok(source.to_string());
    }
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    Ok(path.to_string_lossy().into_owned())
}

/// `SRC=DEST`, `SRC` (grafted at the root under its own name) or `=DEST`
/// (empty directory).
pub fn parse_graft(text: &str) -> Result<GraftPoint, ArgError> {
    let (source, dest) = match text.split_once('=') {
        Some((source, dest)) => (source, dest.to_string()),
        None => {
            let name = uri::basename(text).ok_or_else(|| ArgError::Unnamed(text.to_string()))?;
            (text, name)
        }
    };
    let dest = dest.trim_matches('/');
    if dest.is_empty() {
        return Err(ArgError::EmptyPath);
    }
    let dest = format!("/{dest}");
    if source.is_empty() {
        return Ok(GraftPoint::directory(dest));
    }
    Ok(GraftPoint::new(source_uri(source)?, dest))
}

/// `SECONDS[.FRACTION]` or `MM:SS[.FRACTION]`, as nanoseconds.
pub fn parse_time(text: &str) -> Result<u64, ArgError> {
    let invalid = || ArgError::InvalidTime(text.to_string());
    let (minutes, seconds) = match text.split_once(':') {
        Some((m, s)) => (m.parse::<u64>().map_err(|_| invalid())?, s),
        None => (0, text),
    };
    let (whole, fraction) = seconds.split_once('.').unwrap_or((seconds, ""));
    if whole.is_empty() || fraction.len() > 9 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let whole: u64 = whole.parse().map_err(|_| invalid())?;
    let nanos: u64 = if fraction.is_empty() { 0 } else { format!("{fraction:0<9}").parse().map_err(|_| invalid())? };
    (minutes * 60 + whole)
        .checked_mul(NANOS_PER_SECOND)
        .and_then(|n| n.checked_add(nanos))
        .ok_or_else(invalid)
}

fn stream_format(source: &str) -> StreamFormat {
    let ext = source.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("raw" | "pcm" | "cdda") => StreamFormat::RAW_LITTLE_ENDIAN,
        _ => StreamFormat::UNDEFINED,
    }
}

/// `FILE[@START-END]`: either bound of the range may be left out.
pub fn parse_track(text: &str) -> Result<StreamTrack, ArgError> {
    let (file, range) = match text.rsplit_once('@') {
        Some((file, range)) if range.contains('-') => (file, Some(range)),
        _ => (text, None),
    };
    let source = source_uri(file)?;
    let mut track = StreamTrack::new(source.clone(), stream_format(&source));
    if let Some(range) = range {
        let (start, end) = range.split_once('-').unwrap_or((range, ""));
        if !start.is_empty() {
            track = track.start(parse_time(start)?);
        }
        if !end.is_empty() {
            let end = parse_time(end)?;
            if end <= track.start {
                return Err(ArgError::InvalidRange(range.to_string()));
            }
            track = track.end(end);
        }
    }
    Ok(track)
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
