// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal URI helpers for graft and stream sources.
//!
//! Sources are either plain filesystem paths or `scheme://` URIs; only
//! `file://` URIs and plain paths are local.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::path::{Path, PathBuf};

/// Characters escaped in the path component of a `file://` URI.
const PATH_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// The URI scheme, or `None` for a plain path.
pub fn scheme(uri: &str) -> Option<&str> {
    let (scheme, _) = uri.split_once("://")?;
    let valid = !scheme.is_empty()
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

pub fn is_local(uri: &str) -> bool {
    match scheme(uri) {
        None => true,
        Some(s) => s.eq_ignore_ascii_case("file"),
    }
}

/// Local filesystem path for a local URI; `None` for remote ones.
pub fn to_path(uri: &str) -> Option<PathBuf> {
    match scheme(uri) {
        None => Some(PathBuf::from(uri)),
        Some(s) if s.eq_ignore_ascii_case("file") => {
            let rest = &uri[s.len() + 3..];
            let path = rest.strip_prefix("localhost").unwrap_or(rest);
            if !path.starts_with('/') {
                return None;
            }
            let decoded = percent_decode_str(path).decode_utf8().ok()?;
            Some(PathBuf::from(decoded.into_owned()))
        }
        Some(_) => None,
    }
}

/// `file://` URI for `path`; relative paths are made absolute against the
/// current directory.
pub fn from_path(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let text = absolute.to_string_lossy();
    format!("file://{}", utf8_percent_encode(&text, PATH_SET))
}

/// Percent-decode a URI fragment, replacing invalid UTF-8.
pub fn decode(text: &str) -> String {
    percent_decode_str(text).decode_utf8_lossy().into_owned()
}

/// Last path segment of a URI, decoded, for naming local copies.
pub fn basename(uri: &str) -> Option<String> {
    let trimmed = uri.trim_end_matches('/');
    let last = trimmed.rsplit('/').next()?;
    if last.is_empty() || last.ends_with(':') {
        return None;
    }
    let name = percent_decode_str(last).decode_utf8().ok()?;
    if name.contains('/') || name == "." || name == ".." {
        return None;
    }
    Some(name.into_owned())
}

#[cfg(test)]
#[path = "uri_tests.rs"]
mod tests;
