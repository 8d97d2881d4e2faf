// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording and blanking with `wodim`.
//!
//! Tracks are written from their files, or from the upstream stage through
//! stdin with an announced `tsize=`. Drives that refuse disc-at-once get a
//! second run in track-at-once mode.

use burner_core::{
    uri, Action, BurnAction, BurnFlags, BurnerError, ErrorKind, StreamFormat, TrackKind, TrackType,
};
use burner_engine::{
    Activation, Argv, DeferredError, ErrorResponse, JobContext, JobError, PostAction, Process, ProcessSpec,
};

const NAME: &str = "wodim";
const MIB: u64 = 1024 * 1024;

/// What one line of `wodim` output means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WodimLine {
    /// `Track 01:   12 of  650 MB written`
    Progress { track: u32, written_mb: u64, total_mb: Option<u64> },
    Phase(BurnAction),
    Failure(ErrorKind, &'static str),
    /// The drive cannot write in disc-at-once mode
    DaoRefused,
    Other,
}

fn parse_progress(line: &str) -> Option<WodimLine> {
    let rest = line.strip_prefix("Track ")?;
    let (number, rest) = rest.split_once(':')?;
    let track = number.trim().parse().ok()?;
    let (counts, _) = rest.split_once("MB written")?;
    let (written, total) = match counts.split_once(" of ") {
        Some((written, total)) => (written, Some(total.trim().parse().ok()?)),
        None => (counts, None),
    };
    Some(WodimLine::Progress { track, written_mb: written.trim().parse().ok()?, total_mb: total })
}

/// Classify a line from either pipe.
pub fn parse_line(line: &str) -> WodimLine {
    let line = line.trim();
    if let Some(progress) = parse_progress(line) {
        return progress;
    }

    const REFUSED: [&str; 3] = ["Cannot do DAO", "does not support SAO", "does not support DAO"];
    if REFUSED.iter().any(|r| line.contains(r)) {
        return WodimLine::DaoRefused;
    }

    const FAILURES: [(&str, ErrorKind, &str); 11] = [
        ("Device or resource busy", ErrorKind::DriveBusy, "the drive is busy"),
        ("Cannot open SCSI driver", ErrorKind::Permission, "the drive cannot be opened"),
        ("Operation not permitted", ErrorKind::Permission, "not allowed to access the drive"),
        ("Data may not fit", ErrorKind::MediumSpace, "not enough space available on the disc"),
        ("Data will not fit", ErrorKind::MediumSpace, "not enough space available on the disc"),
        ("No disk / Wrong disk", ErrorKind::MediumNone, "no disc in the drive"),
        ("medium not present", ErrorKind::MediumNone, "no disc in the drive"),
        ("Cannot blank disk", ErrorKind::MediumNotRewritable, "the disc cannot be blanked"),
        ("does not support blanking", ErrorKind::MediumNotRewritable, "the disc cannot be blanked"),
        ("DMA speed too slow", ErrorKind::SlowDma, "the system is too slow to write at this speed"),
        ("write failed", ErrorKind::WriteMedium, "an error occurred while writing to the disc"),
    ];
    for (needle, kind, message) in FAILURES {
        if line.contains(needle) {
            return WodimLine::Failure(kind, message);
        }
    }

    const PHASES: [(&str, BurnAction); 6] = [
        ("Last chance to quit", BurnAction::StartRecording),
        ("Performing OPC", BurnAction::Preparing),
        ("Writing pregap", BurnAction::Leadin),
        ("Starting new track", BurnAction::Recording),
        ("Fixating", BurnAction::Fixating),
        ("Blanking", BurnAction::Blanking),
    ];
    for (needle, action) in PHASES {
        if line.starts_with(needle) {
            return WodimLine::Phase(action);
        }
    }
    WodimLine::Other
}

#[derive(Default)]
pub struct Wodim {
    /// Forced once the drive refused disc-at-once
    tao: bool,
    dao_refused: bool,
    track: u32,
    track_total_mb: u64,
    finished_mb: u64,
    progress_started: bool,
}

impl Wodim {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrapped as a job.
    pub fn job() -> Process<Self> {
        Process::new(Self::new())
    }

    fn reset_run(&mut self) {
        self.dao_refused = false;
        self.track = 0;
        self.track_total_mb = 0;
        self.finished_mb = 0;
        self.progress_started = false;
    }

    fn device_arg(ctx: &JobContext) -> Result<String, JobError> {
        let device = match ctx.bus_target_lun() {
            Ok(btl) => btl,
            Err(_) => ctx.device()?.display().to_string(),
        };
        Ok(format!("dev={device}"))
    }

    fn record_args(&self, ctx: &JobContext, argv: &mut Argv) -> Result<(), JobError> {
        let flags = ctx.flags();
        if let Ok(speed) = ctx.speed() {
            argv.push(format!("speed={speed}"));
        }
        if flags.contains(BurnFlags::DUMMY) {
            argv.push("-dummy");
        }
        if flags.contains(BurnFlags::EJECT) {
            argv.push("-eject");
        }
        if flags.contains(BurnFlags::BURNPROOF) {
            argv.push("driveropts=burnfree");
        }
        if flags.contains(BurnFlags::OVERBURN) {
            argv.push("-overburn");
        }
        if flags.contains(BurnFlags::MULTI) {
            argv.push("-multi");
        }
        if flags.contains(BurnFlags::RAW) {
            argv.push("-raw96r");
        } else if flags.contains(BurnFlags::DAO) && !self.tao {
            argv.push("-dao");
        } else {
            argv.push("-tao");
        }

        if ctx.input_fd()?.is_some() {
            let blocks = ctx.session_output_size().blocks;
            if blocks == 0 {
                return Err(JobError::new(ErrorKind::InputInvalid, "the size of the piped track is unknown"));
            }
            match ctx.input_type() {
                TrackType::Stream(format) => {
                    argv.push("-audio");
                    if format.contains(StreamFormat::RAW_LITTLE_ENDIAN) {
                        argv.push("-swab");
                    }
                }
                _ => argv.push("-data"),
            }
            argv.push(format!("tsize={blocks}s"));
            argv.push("-");
            return Ok(());
        }

        if ctx.tracks().is_empty() {
            return Err(JobError::new(ErrorKind::Empty, "nothing to record"));
        }
        for track in ctx.tracks() {
            match track.kind() {
                TrackKind::Image(image) => {
                    argv.push("-data");
                    argv.push(&image.image);
                }
                TrackKind::Stream(stream) => {
                    let Some(path) = uri::to_path(&stream.source) else {
                        return Err(JobError::new(
                            ErrorKind::FileNotLocal,
                            format!("\"{}\" is not a local file", stream.source),
                        ));
                    };
                    argv.push("-audio");
                    if stream.format.contains(StreamFormat::RAW_LITTLE_ENDIAN) {
                        argv.push("-swab");
                    }
                    argv.push(path);
                }
                TrackKind::Data(_) | TrackKind::Disc(_) => {
                    return burner_engine::not_supported(NAME, "recording a track that is not a file");
                }
            }
        }
        Ok(())
    }

    fn progress(
        &mut self,
        ctx: &mut JobContext,
        track: u32,
        written_mb: u64,
        total_mb: Option<u64>,
    ) -> Result<(), JobError> {
        if !self.progress_started {
            ctx.start_progress(false)?;
            ctx.set_dangerous(true)?;
            self.progress_started = true;
        }
        if track != self.track {
            if self.track != 0 {
                self.finished_mb += self.track_total_mb;
            }
            self.track = track;
            let label = format!("Writing track {track:02}");
            ctx.set_current_action(BurnAction::Recording, Some(label.as_str()), false)?;
        }
        self.track_total_mb = total_mb.unwrap_or(written_mb);
        ctx.set_written_session((self.finished_mb + written_mb) * MIB)
    }

    fn handle(&mut self, ctx: &mut JobContext, line: &str, deferred: &mut DeferredError) -> Result<(), JobError> {
        match parse_line(line) {
            WodimLine::Progress { track, written_mb, total_mb } => self.progress(ctx, track, written_mb, total_mb),
            WodimLine::Phase(action) => ctx.set_current_action(action, None, false),
            WodimLine::Failure(kind, message) => {
                tracing::warn!(job = NAME, %line, "tool reported a failure");
                deferred.set(BurnerError::new(kind, message));
                Ok(())
            }
            WodimLine::DaoRefused => {
                tracing::info!(job = NAME, "drive refused disc-at-once");
                self.dao_refused = true;
                deferred.set(BurnerError::new(ErrorKind::General, "the drive cannot write in disc-at-once mode"));
                Ok(())
            }
            WodimLine::Other => Ok(()),
        }
    }
}

impl ProcessSpec for Wodim {
    fn name(&self) -> &str {
        NAME
    }

    fn activate(&mut self, ctx: &mut JobContext) -> Result<Activation, JobError> {
        match ctx.action() {
            Action::Record | Action::Erase => Ok(Activation::Ready),
            _ => Ok(Activation::Skip),
        }
    }

    fn set_argv(&mut self, ctx: &mut JobContext) -> Result<Argv, JobError> {
        self.reset_run();
        let mut argv = Argv::new(ctx.config().tool(NAME)).arg("-v").arg(Self::device_arg(ctx)?);
        match ctx.action() {
            Action::Record => {
                self.record_args(ctx, &mut argv)?;
                ctx.set_current_action(BurnAction::StartRecording, None, false)?;
            }
            Action::Erase => {
                if ctx.flags().contains(BurnFlags::DUMMY) {
                    argv.push("-dummy");
                }
                let mode = if ctx.flags().contains(BurnFlags::FAST_BLANK) { "fast" } else { "all" };
                argv.push(format!("blank={mode}"));
                ctx.set_current_action(BurnAction::Blanking, None, false)?;
                ctx.set_dangerous(true)?;
            }
            _ => return burner_engine::not_supported(NAME, "wodim outside RECORD or ERASE action"),
        }
        Ok(argv)
    }

    fn wants_stdout(&self) -> bool {
        true
    }

    fn stdout_line(&mut self, ctx: &mut JobContext, line: &str, deferred: &mut DeferredError) -> Result<(), JobError> {
        self.handle(ctx, line, deferred)
    }

    fn stderr_line(&mut self, ctx: &mut JobContext, line: &str, deferred: &mut DeferredError) -> Result<(), JobError> {
        self.handle(ctx, line, deferred)
    }

    fn post(&mut self, ctx: &mut JobContext) -> Result<PostAction, JobError> {
        ctx.set_dangerous(false)?;
        ctx.finished_session()?;
        Ok(PostAction::Done)
    }

    fn on_error(&mut self, ctx: &mut JobContext, kind: ErrorKind) -> ErrorResponse {
        if self.dao_refused && !self.tao && ctx.action() == Action::Record {
            tracing::info!(job = NAME, %kind, "retrying in track-at-once mode");
            self.tao = true;
            return ErrorResponse::Retry;
        }
        ErrorResponse::Propagate
    }
}

#[cfg(test)]
#[path = "wodim_tests.rs"]
mod tests;
