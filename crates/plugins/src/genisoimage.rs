// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ISO9660 images with `genisoimage`.
//!
//! The graft table goes to the tool as a `-path-list` file of
//! `dest=source` lines. In SIZE action the tool only prints the number of
//! 2048-byte extents the image would take.

use burner_core::{uri, Action, BurnAction, BurnerError, DataTrack, ErrorKind, FsFlags, TrackType};
use burner_engine::{Activation, Argv, DeferredError, JobContext, JobError, Process, ProcessSpec, PostAction};
use std::fmt::Write as _;
use std::path::PathBuf;

const NAME: &str = "genisoimage";
const BLOCK: u64 = 2048;

/// What one line of tool output means.
#[derive(Debug, Clone, PartialEq)]
pub enum IsoLine {
    Progress(f64),
    Failure(ErrorKind, &'static str),
    Other,
}

/// Classify a stderr line.
pub fn parse_stderr(line: &str) -> IsoLine {
    let line = line.trim();
    if let Some((percent, _)) = line.split_once("% done") {
        if let Ok(value) = percent.trim().parse::<f64>() {
            return IsoLine::Progress((value / 100.0).clamp(0.0, 1.0));
        }
    }
    const FAILURES: [(&str, ErrorKind, &str); 8] = [
        ("Joliet tree sort failed", ErrorKind::ImageJoliet, "some files have names too long or duplicated for Joliet"),
        ("No space left on device", ErrorKind::DiskSpace, "the location for the image has no space left"),
        ("Permission denied", ErrorKind::Permission, "a file or the image location cannot be accessed"),
        ("Unable to open disc image file", ErrorKind::Permission, "the image file cannot be created"),
        ("Value too large for defined data type", ErrorKind::ImageInvalid, "a file is too large for this filesystem"),
        ("Incorrectly encoded string", ErrorKind::InputInvalid, "some file names are not valid in the current encoding"),
        ("Unknown charset", ErrorKind::InputInvalid, "unknown character encoding"),
        ("No such file or directory", ErrorKind::FileNotFound, "a grafted file does not exist"),
    ];
    for (needle, kind, message) in FAILURES {
        if line.contains(needle) {
            return IsoLine::Failure(kind, message);
        }
    }
    if line.contains("Use genisoimage -help") {
        return IsoLine::Failure(ErrorKind::General, "genisoimage rejected its arguments");
    }
    IsoLine::Other
}

/// Extent count from `-print-size` output: either a bare number (stdout
/// not a tty) or the verbose stderr form.
pub fn parse_size(line: &str) -> Option<u64> {
    let line = line.trim();
    let number = line.rsplit_once('=').map_or(line, |(_, n)| n.trim());
    number.parse().ok()
}

/// Escape the characters `-graft-points` treats specially.
pub fn escape_graft(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || c == '=' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn local_path(source: &str) -> Result<PathBuf, JobError> {
    uri::to_path(source).ok_or_else(|| {
        JobError::new(ErrorKind::FileNotLocal, format!("\"{source}\" is not a local file"))
    })
}

/// Write the path-list file for `data`; empty directories are grafted from
/// an empty temp dir.
fn write_path_list(ctx: &mut JobContext, data: &DataTrack) -> Result<PathBuf, JobError> {
    let mut text = String::new();
    let mut empty_dir: Option<PathBuf> = None;
    for graft in &data.grafts {
        let source = match graft.uri.as_deref() {
            Some(source) => local_path(source)?,
            None => match &empty_dir {
                Some(dir) => dir.clone(),
                None => {
                    let dir = ctx.tmp_dir()?;
                    empty_dir = Some(dir.clone());
                    dir
                }
            },
        };
        let _ = writeln!(
            text,
            "{}={}",
            escape_graft(&graft.path),
            escape_graft(&source.to_string_lossy())
        );
    }
    let list = ctx.tmp_file(Some(".paths"))?;
    std::fs::write(&list, text).map_err(|e| JobError::io(format!("cannot write {}", list.display()), &e))?;
    Ok(list)
}

fn write_exclude_list(ctx: &mut JobContext, data: &DataTrack) -> Result<Option<PathBuf>, JobError> {
    let paths: Vec<PathBuf> = data.excluded.iter().filter_map(|u| uri::to_path(u)).collect();
    if paths.is_empty() {
        return Ok(None);
    }
    let text: String = paths.iter().map(|p| format!("{}\n", p.display())).collect();
    let list = ctx.tmp_file(Some(".excluded"))?;
    std::fs::write(&list, text).map_err(|e| JobError::io(format!("cannot write {}", list.display()), &e))?;
    Ok(Some(list))
}

#[derive(Default)]
pub struct Genisoimage {
    size_reported: bool,
}

impl Genisoimage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrapped as a job.
    pub fn job() -> Process<Self> {
        Process::new(Self::new())
    }
}

impl ProcessSpec for Genisoimage {
    fn name(&self) -> &str {
        NAME
    }

    fn activate(&mut self, ctx: &mut JobContext) -> Result<Activation, JobError> {
        if !matches!(ctx.action(), Action::Image | Action::Size) {
            return Ok(Activation::Skip);
        }
        if ctx.action() == Action::Image && !matches!(ctx.output_type(), TrackType::Image(_)) {
            return Ok(Activation::Skip);
        }
        match ctx.current_track() {
            Ok(track) if track.as_data().is_some() => Ok(Activation::Ready),
            _ => Ok(Activation::Skip),
        }
    }

    fn set_argv(&mut self, ctx: &mut JobContext) -> Result<Argv, JobError> {
        let track = ctx.current_track()?;
        let Some(data) = track.as_data() else {
            return burner_engine::not_supported(NAME, "image of a non data track");
        };
        self.size_reported = false;

        let mut argv = Argv::new(ctx.config().tool(NAME)).arg("-r");
        if data.fs.contains(FsFlags::JOLIET) {
            argv.extend(["-J", "-joliet-long"]);
        }
        if data.fs.contains(FsFlags::ISO_LEVEL3) {
            argv.extend(["-iso-level", "3"]);
        }
        if data.fs.contains(FsFlags::UDF) {
            argv.push("-udf");
        }
        if data.fs.contains(FsFlags::VIDEO) {
            argv.push("-dvd-video");
        }
        if data.fs.contains(FsFlags::SYMLINK) {
            argv.push("-f");
        }
        if let Some(label) = ctx.data_label() {
            argv.extend(["-V", label.as_str()]);
        }
        argv.push("-graft-points");
        let list = write_path_list(ctx, data)?;
        argv.push("-path-list");
        argv.push(&list);
        if let Some(excluded) = write_exclude_list(ctx, data)? {
            argv.push("-exclude-list");
            argv.push(&excluded);
        }

        match ctx.action() {
            Action::Size => {
                argv.extend(["-quiet", "-print-size"]);
                ctx.set_current_action(BurnAction::GettingSize, None, false)?;
            }
            Action::Image => {
                if ctx.output_fd()?.is_none() {
                    let (image, _) = ctx.image_output()?;
                    argv.push("-o");
                    argv.push(&image);
                }
                ctx.set_current_action(BurnAction::CreatingImage, None, false)?;
            }
            _ => return burner_engine::not_supported(NAME, "genisoimage outside IMAGE or SIZE action"),
        }
        Ok(argv)
    }

    fn wants_stdout(&self) -> bool {
        true
    }

    fn stdout_line(&mut self, ctx: &mut JobContext, line: &str, _deferred: &mut DeferredError) -> Result<(), JobError> {
        if ctx.action() != Action::Size {
            return Ok(());
        }
        if let Some(blocks) = parse_size(line) {
            tracing::debug!(job = NAME, blocks, "image size");
            ctx.set_output_size_for_current_track(blocks, blocks * BLOCK)?;
            self.size_reported = true;
        }
        Ok(())
    }

    fn stderr_line(&mut self, ctx: &mut JobContext, line: &str, deferred: &mut DeferredError) -> Result<(), JobError> {
        match parse_stderr(line) {
            IsoLine::Progress(_) if ctx.action() == Action::Size => Ok(()),
            IsoLine::Progress(fraction) => ctx.set_progress(fraction),
            IsoLine::Failure(kind, message) => {
                tracing::warn!(job = NAME, %line, "tool reported a failure");
                deferred.set(BurnerError::new(kind, message));
                Ok(())
            }
            IsoLine::Other => {
                if ctx.action() == Action::Size && !self.size_reported {
                    if let Some(blocks) = line.contains("extents").then(|| parse_size(line)).flatten() {
                        ctx.set_output_size_for_current_track(blocks, blocks * BLOCK)?;
                        self.size_reported = true;
                    }
                }
                Ok(())
            }
        }
    }

    fn post(&mut self, ctx: &mut JobContext) -> Result<PostAction, JobError> {
        if ctx.action() == Action::Size && !self.size_reported {
            return Err(JobError::new(ErrorKind::General, "genisoimage did not report the image size"));
        }
        ctx.finished_track()?;
        Ok(PostAction::Done)
    }
}

#[cfg(test)]
#[path = "genisoimage_tests.rs"]
mod tests;
