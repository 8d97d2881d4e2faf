// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The side channel every job reads its inputs from and reports through.
//!
//! One `JobContext` lives for a whole session and is only ever touched from
//! the session loop. While the loop dispatches a call to a job it enters a
//! [`JobScope`] naming that job; mutators called outside a scope fail with
//! [`JobError::NotReady`].

mod progress;

use crate::config::EngineConfig;
use crate::error::{not_ready, not_supported, JobError};
use crate::events::SessionEvent;
use crate::link::JobLink;
use crate::session_log::SessionLog;
use crate::temp::TempStore;
use burner_core::tags::keys;
use burner_core::{
    Action, BurnAction, BurnFlags, BurnerError, Drive, ErrorKind, ImageFormat, MediumFamily,
    MediumInfo, Status, TagValue, Tags, TrackId, TrackRef, TrackSize, TrackType,
};
use progress::Progress;
use std::collections::{BTreeMap, HashMap};
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Where a task puts what it produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOutput {
    pub track_type: TrackType,
    /// Final image location; a temp file is allocated when unset
    pub image: Option<PathBuf>,
    pub toc: Option<PathBuf>,
    /// Directory receiving one file per stream track; temp files when unset
    pub dir: Option<PathBuf>,
}

/// Identity of the job a call is dispatched to.
#[derive(Debug, Clone)]
pub(crate) struct JobScope {
    pub(crate) slot: usize,
    pub(crate) name: String,
    pub(crate) link: JobLink,
    pub(crate) input: Option<Arc<OwnedFd>>,
    pub(crate) output: Option<Arc<OwnedFd>>,
    pub(crate) last: bool,
}

/// What the loop should do once the current dispatch returns.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TaskSignal {
    /// The job is done with every input track
    Finished { slot: usize },
    /// The job is done with the current input track; more remain
    NextTrack { slot: usize },
    Error { slot: usize, error: BurnerError },
}

pub struct JobContext {
    config: Arc<EngineConfig>,
    action: Action,
    flags: BurnFlags,
    output: TaskOutput,
    tags: Tags,
    target: Option<Arc<dyn Drive>>,

    tracks: Vec<TrackRef>,
    current: usize,
    done: Vec<TrackRef>,
    produced: Vec<TrackRef>,
    producers: HashMap<TrackId, TrackRef>,
    output_sizes: BTreeMap<usize, TrackSize>,

    image_output: Option<(PathBuf, Option<PathBuf>)>,
    audio_outputs: BTreeMap<usize, PathBuf>,
    temp: TempStore,

    progress: Progress,
    log: Option<SessionLog>,
    subscribers: Vec<mpsc::UnboundedSender<SessionEvent>>,

    scope: Option<JobScope>,
    signal: Option<TaskSignal>,
}

impl JobContext {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        let temp = TempStore::new(config.tmp_dir.clone());
        let log = config.session_log.clone().map(SessionLog::new);
        Self {
            config,
            action: Action::None,
            flags: BurnFlags::empty(),
            output: TaskOutput::default(),
            tags: Tags::new(),
            target: None,
            tracks: Vec::new(),
            current: 0,
            done: Vec::new(),
            produced: Vec::new(),
            producers: HashMap::new(),
            output_sizes: BTreeMap::new(),
            image_output: None,
            audio_outputs: BTreeMap::new(),
            temp,
            progress: Progress::default(),
            log,
            subscribers: Vec::new(),
            scope: None,
            signal: None,
        }
    }

    // ── Session setup ───────────────────────────────────────────────────

    pub fn with_flags(mut self, flags: BurnFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_tracks(mut self, tracks: impl IntoIterator<Item = TrackRef>) -> Self {
        self.tracks = tracks.into_iter().collect();
        self
    }

    pub fn with_target(mut self, drive: Arc<dyn Drive>) -> Self {
        self.target = Some(drive);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Self {
        self.tags.set(key, value);
        self
    }

    pub(crate) fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    // ── Loop plumbing ───────────────────────────────────────────────────

    /// Prepare for the next task: the previous task's products become its
    /// inputs.
    pub(crate) fn begin_task(&mut self, action: Action, output: TaskOutput) {
        if !self.produced.is_empty() {
            self.tracks = std::mem::take(&mut self.produced);
        }
        self.action = action;
        self.output = output;
        self.current = 0;
        self.done.clear();
        self.produced.clear();
        self.output_sizes.clear();
        self.image_output = None;
        self.audio_outputs.clear();
        self.progress.reset();
        self.signal = None;
    }

    /// Move on to the next input track after `NextTrack`.
    pub(crate) fn advance_track(&mut self) {
        if let Some(track) = self.tracks.get(self.current) {
            self.done.push(track.clone());
        }
        self.current += 1;
        self.progress.next_track();
    }

    /// Record the last input track as done after `Finished`.
    pub(crate) fn complete_tracks(&mut self) {
        for track in self.tracks.iter().skip(self.current) {
            self.done.push(track.clone());
        }
        self.current = self.tracks.len();
    }

    pub(crate) fn enter(&mut self, scope: JobScope) {
        self.scope = Some(scope);
    }

    pub(crate) fn leave(&mut self) {
        self.scope = None;
    }

    pub(crate) fn take_signal(&mut self) -> Option<TaskSignal> {
        self.signal.take()
    }

    pub(crate) fn has_error(&self) -> bool {
        matches!(self.signal, Some(TaskSignal::Error { .. }))
    }

    pub(crate) fn emit(&mut self, event: SessionEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn scope(&self, what: &'static str) -> Result<&JobScope, JobError> {
        match &self.scope {
            Some(scope) => Ok(scope),
            None => not_ready("context", what),
        }
    }

    fn job(&self) -> &str {
        self.scope.as_ref().map_or("session", |s| s.name.as_str())
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn flags(&self) -> BurnFlags {
        self.flags
    }

    /// Name of the job the current call is dispatched to.
    pub fn job_name(&self) -> Option<&str> {
        self.scope.as_ref().map(|s| s.name.as_str())
    }

    pub fn link(&self) -> Result<JobLink, JobError> {
        Ok(self.scope("link")?.link.clone())
    }

    /// Read end of the pipe from the upstream job, in piped mode.
    pub fn input_fd(&self) -> Result<Option<BorrowedFd<'_>>, JobError> {
        Ok(self.scope("input fd")?.input.as_deref().map(AsFd::as_fd))
    }

    /// Write end of the pipe to the downstream job, in piped mode.
    pub fn output_fd(&self) -> Result<Option<BorrowedFd<'_>>, JobError> {
        Ok(self.scope("output fd")?.output.as_deref().map(AsFd::as_fd))
    }

    /// Whether the job is the final stage of its task.
    pub fn is_last(&self) -> Result<bool, JobError> {
        Ok(self.scope("position")?.last)
    }

    pub fn tracks(&self) -> &[TrackRef] {
        &self.tracks
    }

    pub fn done_tracks(&self) -> &[TrackRef] {
        &self.done
    }

    /// Tracks added so far by the current task.
    pub fn produced_tracks(&self) -> &[TrackRef] {
        &self.produced
    }

    /// The track produced from input `id`, if any.
    pub fn produced_for(&self, id: TrackId) -> Option<&TrackRef> {
        self.producers.get(&id)
    }

    pub fn current_track(&self) -> Result<TrackRef, JobError> {
        match self.tracks.get(self.current) {
            Some(track) => Ok(track.clone()),
            None => not_ready(self.job(), "no current track"),
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn input_type(&self) -> TrackType {
        self.tracks.get(self.current).map(|t| t.track_type()).unwrap_or_default()
    }

    pub fn output_type(&self) -> TrackType {
        self.output.track_type
    }

    pub fn tag(&self, key: &str) -> Option<TagValue> {
        self.tags.get(key).cloned()
    }

    pub fn audio_title(&self) -> Option<String> {
        self.tags.get_str(keys::AUDIO_TITLE).map(str::to_string)
    }

    pub fn data_label(&self) -> Option<String> {
        self.tags.get_str(keys::DATA_LABEL).map(str::to_string)
    }

    /// Size of what the task outputs: the sizes jobs reported in SIZE
    /// action, else the sum of the input tracks' sizes.
    pub fn session_output_size(&self) -> TrackSize {
        if !self.output_sizes.is_empty() {
            return self.output_sizes.values().fold(TrackSize::default(), |a, b| a + *b);
        }
        self.tracks.iter().filter_map(|t| t.size()).fold(TrackSize::default(), |a, b| a + b)
    }

    pub fn target(&self) -> Option<Arc<dyn Drive>> {
        self.target.clone()
    }

    fn drive(&self) -> Result<&Arc<dyn Drive>, JobError> {
        match &self.target {
            Some(drive) => Ok(drive),
            None => not_supported(self.job(), "no target drive"),
        }
    }

    pub fn medium(&self) -> Result<MediumInfo, JobError> {
        match self.drive()?.medium() {
            Some(medium) => Ok(medium),
            None => Err(JobError::new(ErrorKind::MediumNone, "no medium in the drive")),
        }
    }

    pub fn device(&self) -> Result<PathBuf, JobError> {
        Ok(self.drive()?.device_path().to_path_buf())
    }

    pub fn bus_target_lun(&self) -> Result<String, JobError> {
        match self.drive()?.bus_target_lun() {
            Some(btl) => Ok(btl),
            None => not_supported(self.job(), "drive has no bus/target/lun"),
        }
    }

    pub fn last_session_address(&self) -> Result<u64, JobError> {
        match self.medium()?.last_session_address {
            Some(address) => Ok(address),
            None => not_supported(self.job(), "medium has no previous session"),
        }
    }

    pub fn next_writable_address(&self) -> Result<u64, JobError> {
        match self.medium()?.next_writable_address {
            Some(address) => Ok(address),
            None => not_supported(self.job(), "medium is not appendable"),
        }
    }

    fn base_rate(&self) -> Result<u64, JobError> {
        let medium = self.medium()?;
        match MediumFamily::from_status(medium.status) {
            Some(family) => Ok(family.base_rate()),
            None => not_supported(self.job(), "rate of a non optical medium"),
        }
    }

    pub fn max_rate(&self) -> Result<u64, JobError> {
        match self.drive()?.max_rate() {
            Some(rate) => Ok(rate),
            None => not_supported(self.job(), "drive does not report its maximum rate"),
        }
    }

    /// Requested write rate, bytes per second.
    pub fn rate(&self) -> Result<u64, JobError> {
        match self.config.speed {
            Some(speed) => Ok(u64::from(speed) * self.base_rate()?),
            None => self.max_rate(),
        }
    }

    /// Requested write speed as an "x" factor.
    pub fn speed(&self) -> Result<u32, JobError> {
        let base = self.base_rate()?;
        Ok((self.rate()? as f64 / base as f64).round() as u32)
    }

    pub fn max_speed(&self) -> Result<u32, JobError> {
        let base = self.base_rate()?;
        Ok((self.max_rate()? as f64 / base as f64).round() as u32)
    }

    /// Measured write rate, bytes per second.
    pub fn current_rate(&self) -> Option<u64> {
        self.progress.rate(Instant::now())
    }

    /// Measured write speed as an "x" factor.
    pub fn current_speed(&self) -> Option<f64> {
        let rate = self.current_rate()?;
        let base = self.base_rate().ok()?;
        Some(rate as f64 / base as f64)
    }

    /// Image (and TOC) file the job should write. Stable for the task.
    pub fn image_output(&mut self) -> Result<(PathBuf, Option<PathBuf>), JobError> {
        let format = match self.output.track_type {
            TrackType::Image(format) => format,
            _ => return not_supported(self.job(), "image output for a non image task"),
        };
        if let Some(paths) = &self.image_output {
            return Ok(paths.clone());
        }
        let paths = match &self.output.image {
            Some(image) => {
                let toc = match (&self.output.toc, format.needs_toc()) {
                    (Some(toc), _) => Some(toc.clone()),
                    (None, true) => Some(image.with_extension("toc")),
                    (None, false) => None,
                };
                (image.clone(), toc)
            }
            None => {
                let suffix = if format == ImageFormat::Bin { ".iso" } else { ".bin" };
                let image = self.temp.file(Some(suffix))?;
                let toc = if format.needs_toc() { Some(self.temp.file(Some(".toc"))?) } else { None };
                (image, toc)
            }
        };
        self.image_output = Some(paths.clone());
        Ok(paths)
    }

    /// Raw audio file for the current stream track. Stable per track.
    pub fn audio_output(&mut self) -> Result<PathBuf, JobError> {
        if !matches!(self.output.track_type, TrackType::Stream(_)) {
            return not_supported(self.job(), "audio output for a non stream task");
        }
        if let Some(path) = self.audio_outputs.get(&self.current) {
            return Ok(path.clone());
        }
        let path = match &self.output.dir {
            Some(dir) => dir.join(format!("track{:02}.raw", self.current + 1)),
            None => self.temp.file(Some(".raw"))?,
        };
        self.audio_outputs.insert(self.current, path.clone());
        Ok(path)
    }

    /// Allocate a session temp file, removed when the session ends.
    pub fn tmp_file(&mut self, suffix: Option<&str>) -> Result<PathBuf, JobError> {
        Ok(self.temp.file(suffix)?)
    }

    pub fn tmp_dir(&mut self) -> Result<PathBuf, JobError> {
        Ok(self.temp.dir()?)
    }

    pub fn status(&self) -> Status {
        match &self.signal {
            Some(TaskSignal::Error { error, .. }) => Status::failed(error.clone()),
            _ if self.progress.is_started() => {
                Status::not_ready(self.progress.fraction(), self.progress.label.clone())
            }
            _ => Status::running(self.progress.label.clone()),
        }
    }

    // ── Mutators ────────────────────────────────────────────────────────

    /// Hand a produced track to the next stage.
    pub fn add_track(&mut self, track: TrackRef) -> Result<(), JobError> {
        self.scope("add track")?;
        if let Some(input) = self.tracks.get(self.current) {
            self.producers.insert(input.id(), track.clone());
        }
        tracing::debug!(job = self.job(), track = %track.id(), "track added");
        self.produced.push(track.clone());
        self.emit(SessionEvent::TrackAdded(track));
        Ok(())
    }

    /// The current input track is done.
    pub fn finished_track(&mut self) -> Result<(), JobError> {
        let slot = self.scope("finished track")?.slot;
        if self.signal.is_some() {
            return Ok(());
        }
        self.signal = if self.current + 1 < self.tracks.len() {
            Some(TaskSignal::NextTrack { slot })
        } else {
            Some(TaskSignal::Finished { slot })
        };
        Ok(())
    }

    /// Every input track is done.
    pub fn finished_session(&mut self) -> Result<(), JobError> {
        let slot = self.scope("finished session")?.slot;
        if self.signal.is_none() {
            self.signal = Some(TaskSignal::Finished { slot });
        }
        Ok(())
    }

    /// Report an error. Warnings are forwarded and do not stop the task;
    /// only the first error of a task is kept.
    pub fn error(&mut self, error: BurnerError) -> Result<(), JobError> {
        let slot = self.scope("error")?.slot;
        let job = self.job().to_string();
        if error.is_warning() {
            tracing::warn!(job, kind = %error.kind(), "{}", error.message());
            self.emit(SessionEvent::Warning(error));
            return Ok(());
        }
        if let Some(TaskSignal::Error { error: first, .. }) = &self.signal {
            tracing::debug!(job, first = %first, dropped = %error, "error already reported");
            return Ok(());
        }
        tracing::warn!(job, kind = %error.kind(), "{}", error.message());
        if let Some(log) = &self.log {
            log.append(&job, &format!("error: {error}"));
        }
        self.signal = Some(TaskSignal::Error { slot, error });
        Ok(())
    }

    /// Start reporting progress; `total` comes from the input tracks.
    pub fn start_progress(&mut self, force: bool) -> Result<(), JobError> {
        self.scope("start progress")?;
        if force {
            self.progress.reset();
        }
        let size = self.session_output_size();
        let total = (size.bytes > 0).then_some(size.bytes);
        self.progress.start(Instant::now(), total);
        Ok(())
    }

    pub fn reset_progress(&mut self) -> Result<(), JobError> {
        self.scope("reset progress")?;
        self.progress.reset();
        Ok(())
    }

    pub fn set_rate(&mut self, rate: u64) -> Result<(), JobError> {
        self.scope("set rate")?;
        self.progress.set_rate(rate);
        Ok(())
    }

    pub fn set_use_average_rate(&mut self, value: bool) -> Result<(), JobError> {
        self.scope("use average rate")?;
        self.progress.set_use_average(value);
        Ok(())
    }

    /// Bytes written for the current track.
    pub fn set_written_track(&mut self, bytes: u64) -> Result<(), JobError> {
        self.check_progress("written track")?;
        self.progress.set_written_track(bytes);
        self.emit_progress();
        Ok(())
    }

    /// Bytes written for the whole task.
    pub fn set_written_session(&mut self, bytes: u64) -> Result<(), JobError> {
        self.check_progress("written session")?;
        self.progress.set_written_session(bytes);
        self.emit_progress();
        Ok(())
    }

    pub fn set_progress(&mut self, fraction: f64) -> Result<(), JobError> {
        self.check_progress("progress")?;
        self.progress.set_fraction(fraction);
        self.emit_progress();
        Ok(())
    }

    fn check_progress(&mut self, what: &'static str) -> Result<(), JobError> {
        self.scope(what)?;
        if self.action == Action::Size {
            return not_supported(self.job(), "progress while computing a size");
        }
        if !self.progress.is_started() {
            self.progress.start(Instant::now(), None);
        }
        Ok(())
    }

    fn emit_progress(&mut self) {
        let now = Instant::now();
        let event = SessionEvent::Progress {
            fraction: self.progress.fraction(),
            written: self.progress.written(),
            rate: self.progress.rate(now),
            remaining: self.progress.remaining(now),
        };
        self.emit(event);
    }

    /// Change the reported activity. An identical action and label only
    /// notifies again when `force` is set.
    pub fn set_current_action(
        &mut self,
        action: BurnAction,
        label: Option<&str>,
        force: bool,
    ) -> Result<(), JobError> {
        self.scope("current action")?;
        let label = label.unwrap_or(action.label()).to_string();
        if !force && self.progress.action == action && self.progress.label.as_deref() == Some(&label) {
            return Ok(());
        }
        if self.progress.action != action {
            self.progress.reset();
        }
        self.progress.action = action;
        self.progress.label = Some(label.clone());
        tracing::info!(job = self.job(), %label, "action");
        self.emit(SessionEvent::Action { action, label });
        Ok(())
    }

    pub fn current_action(&self) -> BurnAction {
        self.progress.action
    }

    pub fn set_dangerous(&mut self, value: bool) -> Result<(), JobError> {
        self.scope("dangerous")?;
        if self.progress.dangerous != value {
            self.progress.dangerous = value;
            self.emit(SessionEvent::Dangerous(value));
        }
        Ok(())
    }

    pub fn is_dangerous(&self) -> bool {
        self.progress.dangerous
    }

    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Result<(), JobError> {
        self.scope("tag")?;
        self.tags.set(key, value);
        Ok(())
    }

    /// Record the output size computed for the current track in SIZE
    /// action.
    pub fn set_output_size_for_current_track(&mut self, blocks: u64, bytes: u64) -> Result<(), JobError> {
        self.scope("output size")?;
        if self.action != Action::Size {
            return not_supported(self.job(), "output size outside SIZE action");
        }
        self.output_sizes.insert(self.current, TrackSize { blocks, bytes });
        Ok(())
    }

    /// Diagnostic line, to tracing and the session log.
    pub fn log(&mut self, message: &str) {
        let job = self.job().to_string();
        tracing::debug!(job, "{}", message.trim_end());
        if let Some(log) = &self.log {
            log.append(&job, message);
        }
        self.emit(SessionEvent::Log { job, message: message.trim_end().to_string() });
    }

    /// Remove every temp file of the session now.
    pub fn cleanup(&mut self) {
        self.temp.cleanup();
    }
}

impl std::fmt::Debug for JobContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobContext")
            .field("action", &self.action)
            .field("flags", &self.flags)
            .field("tracks", &self.tracks.len())
            .field("current", &self.current)
            .field("produced", &self.produced.len())
            .field("scope", &self.scope.as_ref().map(|s| &s.name))
            .finish()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
