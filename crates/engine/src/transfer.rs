// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recursive copy with byte-level progress.
//!
//! The source is measured first, then copied file by file. Progress is
//! reported as `(copied, total)` with `copied <= total` at every call and
//! `copied == total` on the last call of a successful copy. Cancellation is
//! checked between entries; whatever was copied stays in place.

use crate::error::JobError;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

const CHUNK: usize = 64 * 1024;
const WAIT_STEP: Duration = Duration::from_millis(50);

/// Bytes of every regular file under `path` (or of `path` itself).
pub fn total_size(path: &Path) -> Result<u64, JobError> {
    let mut total = 0;
    for entry in WalkDir::new(path) {
        let entry = entry.map_err(walk_error)?;
        if entry.file_type().is_file() {
            let meta = entry.metadata().map_err(walk_error)?;
            total += meta.len();
        }
    }
    Ok(total)
}

/// Copy `src` (file or directory) to `dest`, blocking.
pub fn copy(
    src: &Path,
    dest: &Path,
    cancel: &CancellationToken,
    mut progress: impl FnMut(u64, u64),
) -> Result<u64, JobError> {
    let total = total_size(src)?;
    remove_placeholder(dest)?;
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| JobError::io(format!("cannot create {}", parent.display()), &e))?;
    }

    let mut finished = 0u64;
    for entry in WalkDir::new(src).sort_by_file_name() {
        if cancel.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        let entry = entry.map_err(walk_error)?;
        let rel = entry.path().strip_prefix(src).unwrap_or(Path::new(""));
        let target = if rel.as_os_str().is_empty() { dest.to_path_buf() } else { dest.join(rel) };
        let kind = entry.file_type();
        if kind.is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| JobError::io(format!("cannot create {}", target.display()), &e))?;
        } else if kind.is_file() {
            let copied = copy_file(entry.path(), &target, cancel, |current| {
                progress((finished + current).min(total), total);
            })?;
            finished += copied;
        } else if kind.is_symlink() {
            let link = fs::read_link(entry.path())
                .map_err(|e| JobError::io(format!("cannot read {}", entry.path().display()), &e))?;
            std::os::unix::fs::symlink(&link, &target)
                .map_err(|e| JobError::io(format!("cannot create {}", target.display()), &e))?;
        }
    }
    progress(total, total);
    Ok(total)
}

/// Run [`copy`] on its own thread while this thread waits, forwarding
/// progress and staying responsive to `cancel`.
pub fn copy_threaded(
    src: &Path,
    dest: &Path,
    cancel: &CancellationToken,
    mut progress: impl FnMut(u64, u64),
) -> Result<u64, JobError> {
    enum Message {
        Progress(u64, u64),
        Done(Result<u64, JobError>),
    }

    let inner = cancel.child_token();
    let (tx, rx) = mpsc::channel();
    let (src_owned, dest_owned, token) = (src.to_path_buf(), dest.to_path_buf(), inner.clone());
    let handle = std::thread::Builder::new()
        .name("transfer".into())
        .spawn(move || {
            let progress_tx = tx.clone();
            let result = copy(&src_owned, &dest_owned, &token, |copied, total| {
                let _ = progress_tx.send(Message::Progress(copied, total));
            });
            let _ = tx.send(Message::Done(result));
        })
        .map_err(|e| JobError::io("cannot start transfer thread", &e))?;

    let result = loop {
        match rx.recv_timeout(WAIT_STEP) {
            Ok(Message::Progress(copied, total)) => progress(copied, total),
            Ok(Message::Done(result)) => break result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if cancel.is_cancelled() {
                    inner.cancel();
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                break Err(JobError::general("transfer thread ended unexpectedly"))
            }
        }
    };
    let _ = handle.join();
    result
}

fn copy_file(
    src: &Path,
    dest: &Path,
    cancel: &CancellationToken,
    mut progress: impl FnMut(u64),
) -> Result<u64, JobError> {
    let mut input = File::open(src).map_err(|e| JobError::io(format!("cannot open {}", src.display()), &e))?;
    let mut output =
        File::create(dest).map_err(|e| JobError::io(format!("cannot create {}", dest.display()), &e))?;
    let mut buf = vec![0u8; CHUNK];
    let mut copied = 0u64;
    loop {
        if cancel.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(JobError::io(format!("cannot read {}", src.display()), &e)),
        };
        output
            .write_all(&buf[..n])
            .map_err(|e| JobError::io(format!("cannot write {}", dest.display()), &e))?;
        copied += n as u64;
        progress(copied);
    }
    Ok(copied)
}

/// A file or empty directory reserved under the destination name.
fn remove_placeholder(dest: &Path) -> Result<(), JobError> {
    let Ok(meta) = fs::symlink_metadata(dest) else {
        return Ok(());
    };
    let result = if meta.is_dir() { fs::remove_dir(dest) } else { fs::remove_file(dest) };
    result.map_err(|e| JobError::io(format!("cannot replace {}", dest.display()), &e))
}

fn walk_error(e: walkdir::Error) -> JobError {
    let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
    match e.into_io_error() {
        Some(io) => JobError::io(path, &io),
        None => JobError::general(format!("filesystem loop at {path}")),
    }
}

#[cfg(test)]
#[path = "transfer_tests.rs"]
mod tests;
