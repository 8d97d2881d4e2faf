// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-file checksums of a data track.
//!
//! In an IMAGE task every grafted file is hashed and an `md5sum`-style
//! manifest is grafted at the root of the future image. In a CHECKSUM task
//! the manifest is read back and each listed file is hashed again through
//! the graft table.

use crate::digest::hash_reader;
use burner_core::tags::keys;
use burner_core::{
    uri, Action, BurnAction, BurnerError, Checksum, ChecksumType, DataTrack, ErrorKind, GraftPoint,
    TrackKind,
};
use burner_engine::{
    Activation, Job, JobContext, JobError, Started, WorkerOutcome, WorkerScope, WorkerThread,
};
use std::fmt::Write as _;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const NAME: &str = "checksum-files";

const MANIFEST_TYPES: [ChecksumType; 3] = [ChecksumType::Md5, ChecksumType::Sha1, ChecksumType::Sha256];

#[derive(Default)]
pub struct ChecksumFiles {
    kind: Option<ChecksumType>,
    worker: Option<WorkerThread>,
}

impl ChecksumFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(kind: ChecksumType) -> Self {
        Self { kind: Some(kind), worker: None }
    }
}

/// One `<hex>  <path>` manifest line; `*` marks binary mode in `md5sum`
/// output and is ignored.
pub fn parse_manifest_line(line: &str) -> Option<(&str, String)> {
    let (hex, rest) = line.trim_end().split_once(' ')?;
    let rest = rest.strip_prefix(' ').or_else(|| rest.strip_prefix('*'))?;
    if hex.is_empty() || rest.is_empty() {
        return None;
    }
    let path = rest.strip_prefix('.').filter(|p| p.starts_with('/')).unwrap_or(rest);
    let path = if path.starts_with('/') { path.to_string() } else { format!("/{path}") };
    Some((hex, path))
}

/// Destination of `rel` under the graft destination `dest`.
fn image_path(dest: &str, rel: &Path) -> String {
    let dest = dest.trim_end_matches('/');
    if rel.as_os_str().is_empty() {
        return if dest.is_empty() { "/".to_string() } else { dest.to_string() };
    }
    format!("{dest}/{}", rel.to_string_lossy())
}

fn manifest_path(kind: ChecksumType) -> Option<String> {
    kind.manifest_name().map(|name| format!("/{name}"))
}

/// The manifest grafted into `data`, with its algorithm.
fn find_manifest(data: &DataTrack) -> Option<(ChecksumType, PathBuf)> {
    MANIFEST_TYPES.iter().find_map(|kind| {
        let target = manifest_path(*kind)?;
        let graft = data.grafts.iter().find(|g| g.path == target)?;
        Some((*kind, uri::to_path(graft.uri.as_deref()?)?))
    })
}

/// Local source of `path` inside the image: the graft with the longest
/// matching destination wins.
fn resolve(grafts: &[GraftPoint], path: &str) -> Option<PathBuf> {
    grafts
        .iter()
        .filter_map(|g| g.source_for(path).map(|source| (g.path.len(), source)))
        .max_by_key(|(len, _)| *len)
        .map(|(_, source)| source)
}

/// Every regular file a data track lays out, as (source, image path),
/// sorted by image path.
fn collect_files(data: &DataTrack, skip: Option<&str>) -> Result<Vec<(PathBuf, String)>, JobError> {
    let mut files = Vec::new();
    for graft in &data.grafts {
        if Some(graft.path.as_str()) == skip {
            continue;
        }
        let Some(source) = graft.uri.as_deref() else {
            continue;
        };
        let Some(root) = uri::to_path(source) else {
            return Err(JobError::new(ErrorKind::FileNotLocal, format!("\"{source}\" is not a local file")));
        };
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let err = e.into_io_error().unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                JobError::io(format!("cannot read {}", root.display()), &err)
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if data.is_excluded(&uri::from_path(path)) || data.is_excluded(&path.to_string_lossy()) {
                continue;
            }
            let rel = path.strip_prefix(&root).unwrap_or(Path::new(""));
            files.push((path.to_path_buf(), image_path(&graft.path, rel)));
        }
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

fn hash_file(kind: ChecksumType, path: &Path, scope: &WorkerScope) -> Result<Checksum, JobError> {
    let mut file = File::open(path).map_err(|e| JobError::io(format!("cannot open {}", path.display()), &e))?;
    hash_reader(kind, &mut file, None, scope)
}

fn write_manifest(
    kind: ChecksumType,
    files: &[(PathBuf, String)],
    out: &Path,
    scope: &WorkerScope,
) -> Result<(), JobError> {
    let total = files.iter().filter_map(|(p, _)| std::fs::metadata(p).ok()).map(|m| m.len()).sum();
    scope.set_total(total);
    let mut text = String::new();
    for (source, dest) in files {
        let checksum = hash_file(kind, source, scope)?;
        let _ = writeln!(text, "{}  .{dest}", checksum.value());
    }
    std::fs::write(out, text).map_err(|e| JobError::io(format!("cannot write {}", out.display()), &e))
}

/// Paths whose digest differs from the manifest, or that are gone.
fn verify_manifest(
    kind: ChecksumType,
    manifest: &Path,
    grafts: &[GraftPoint],
    scope: &WorkerScope,
) -> Result<Vec<String>, JobError> {
    let text = std::fs::read_to_string(manifest)
        .map_err(|e| JobError::io(format!("cannot read {}", manifest.display()), &e))?;
    let entries: Vec<(Checksum, String, Option<PathBuf>)> = text
        .lines()
        .filter_map(parse_manifest_line)
        .filter_map(|(hex, path)| {
            let expected = Checksum::new(kind, hex)?;
            let source = resolve(grafts, &path);
            Some((expected, path, source))
        })
        .collect();
    let total = entries
        .iter()
        .filter_map(|(_, _, s)| s.as_ref().and_then(|s| std::fs::metadata(s).ok()))
        .map(|m| m.len())
        .sum();
    scope.set_total(total);

    let mut mismatches = Vec::new();
    for (expected, path, source) in entries {
        let Some(source) = source else {
            tracing::warn!(job = NAME, %path, "listed file is not in the graft table");
            mismatches.push(path);
            continue;
        };
        match hash_file(kind, &source, scope) {
            Ok(found) if found == expected => {}
            Ok(found) => {
                tracing::warn!(job = NAME, %path, %expected, %found, "checksum mismatch");
                mismatches.push(path);
            }
            Err(JobError::Cancelled) => return Err(JobError::Cancelled),
            Err(e) => {
                tracing::warn!(job = NAME, %path, error = %e, "cannot hash listed file");
                mismatches.push(path);
            }
        }
    }
    Ok(mismatches)
}

impl ChecksumFiles {
    fn start_manifest(&mut self, ctx: &mut JobContext, data: DataTrack) -> Result<WorkerThread, JobError> {
        let track = ctx.current_track()?;
        let kind = self.kind.unwrap_or(ctx.config().checksum);
        let Some(target) = manifest_path(kind) else {
            return burner_engine::not_supported(NAME, "manifest without a checksum type");
        };
        let suffix = format!(".{kind}");
        let out = ctx.tmp_file(Some(suffix.as_str()))?;
        ctx.set_current_action(BurnAction::Checksum, Some("Creating file checksums"), false)?;

        WorkerThread::spawn(NAME, ctx.link()?, move |scope| {
            let result = collect_files(&data, Some(&target)).and_then(|files| {
                write_manifest(kind, &files, &out, scope)?;
                Ok(files.len() as u64)
            });
            let count = match result {
                Ok(count) => count,
                Err(e) => return WorkerOutcome::from_error(e, NAME),
            };
            WorkerOutcome::complete(move |ctx| {
                let mut data = data;
                data.grafts.retain(|g| g.path != target);
                data.grafts.push(GraftPoint::new(uri::from_path(&out), target));
                data.file_count = count + 1;
                ctx.log(&format!("{count} files hashed into {}", out.display()));
                ctx.add_track(track.derive(TrackKind::Data(data)))?;
                ctx.finished_track()
            })
        })
    }

    fn start_verify(&mut self, ctx: &mut JobContext, data: DataTrack) -> Result<WorkerThread, JobError> {
        let track = ctx.current_track()?;
        let Some((kind, manifest)) = find_manifest(&data) else {
            return burner_engine::not_supported(NAME, "data track without a checksum manifest");
        };
        ctx.set_current_action(BurnAction::Checksum, Some("Checking file integrity"), false)?;

        WorkerThread::spawn(NAME, ctx.link()?, move |scope| {
            let mismatches = match verify_manifest(kind, &manifest, &data.grafts, scope) {
                Ok(mismatches) => mismatches,
                Err(e) => return WorkerOutcome::from_error(e, NAME),
            };
            WorkerOutcome::complete(move |ctx| {
                if let Some(first) = mismatches.first() {
                    let message = match mismatches.len() {
                        1 => format!("\"{first}\" is corrupted"),
                        n => format!("\"{first}\" and {} other files are corrupted", n - 1),
                    };
                    track.set_tag(keys::CHECKSUM_MISMATCHES, mismatches.clone());
                    return ctx.error(BurnerError::new(ErrorKind::BadChecksum, message));
                }
                ctx.log("every listed file matches its checksum");
                ctx.finished_track()
            })
        })
    }
}

impl Job for ChecksumFiles {
    fn name(&self) -> &str {
        NAME
    }

    fn activate(&mut self, ctx: &mut JobContext) -> Result<Activation, JobError> {
        let Some(data) = ctx.current_track().ok().and_then(|t| t.as_data().cloned()) else {
            return Ok(Activation::Skip);
        };
        match ctx.action() {
            Action::Image if self.kind.unwrap_or(ctx.config().checksum) != ChecksumType::None => {
                Ok(Activation::Ready)
            }
            Action::Checksum if find_manifest(&data).is_some() => Ok(Activation::Ready),
            Action::Checksum => {
                ctx.error(BurnerError::new(
                    ErrorKind::ChecksumWarning,
                    "the data track carries no checksum manifest",
                ))?;
                Ok(Activation::Skip)
            }
            _ => Ok(Activation::Skip),
        }
    }

    fn start(&mut self, ctx: &mut JobContext) -> Result<Started, JobError> {
        if self.worker.is_some() {
            return Ok(Started::Running);
        }
        let track = ctx.current_track()?;
        let Some(data) = track.as_data().cloned() else {
            return burner_engine::not_supported(NAME, "file checksums of a non data track");
        };
        let worker = match ctx.action() {
            Action::Checksum => self.start_verify(ctx, data)?,
            _ => self.start_manifest(ctx, data)?,
        };
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
#[path = "checksum_files_tests.rs"]
mod tests;
