// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jobs that drive an external command-line tool.
//!
//! A [`ProcessSpec`] describes the tool: its argument vector and how to
//! read its output. [`Process`] turns it into a [`Job`]:
//!
//! - the child runs in its own process group with a `C` locale;
//! - stderr is always captured, stdout only when the `ProcessSpec` wants it and the
//!   job is the last stage (otherwise stdout feeds the next stage);
//! - each captured pipe is read by a tokio task that forwards the bytes
//!   and wakes the loop, where they are split into lines and handed to
//!   its handlers. Stopping aborts the tasks and reads what is left in
//!   the pipes directly;
//! - once both pipes closed, every clock tick polls the child for exit.

mod argv;
mod lines;

pub use argv::Argv;
pub use lines::LineSplitter;

use crate::context::JobContext;
use crate::error::JobError;
use crate::job::{Activation, ErrorResponse, Job, Started};
use crate::link::JobLink;
use burner_core::track::stream;
use burner_core::{
    uri, BurnerError, ErrorKind, ImageFormat, ImageTrack, StreamTrack, Track, TrackKind, TrackType,
};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use std::io;
use std::os::fd::{AsRawFd, OwnedFd};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::unix::pipe;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Time a tool gets to exit after SIGTERM before SIGKILL.
const TERM_GRACE: Duration = Duration::from_secs(2);
const POLL_STEP: Duration = Duration::from_millis(20);

/// Error a parser noticed before the tool exited. Surfaced only if the
/// tool then exits with a failure status.
#[derive(Debug, Default)]
pub struct DeferredError(Option<BurnerError>);

impl DeferredError {
    pub fn set(&mut self, error: BurnerError) {
        self.0 = Some(error);
    }

    pub fn get(&self) -> Option<&BurnerError> {
        self.0.as_ref()
    }

    pub fn take(&mut self) -> Option<BurnerError> {
        self.0.take()
    }
}

/// What a successful exit leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    Done,
    /// Run the tool again with a fresh argument vector
    Retry,
}

/// A command-line tool wrapped as a job.
///
/// Line handlers get the context and the deferred-error slot only; they
/// cannot stop or restart the job while it is dispatching their output.
pub trait ProcessSpec: Send {
    fn name(&self) -> &str;

    fn activate(&mut self, _ctx: &mut JobContext) -> Result<Activation, JobError> {
        Ok(Activation::Ready)
    }

    /// Build the command line. An error here means no child is spawned.
    fn set_argv(&mut self, ctx: &mut JobContext) -> Result<Argv, JobError>;

    /// Whether stdout should be captured when the job is the last stage.
    fn wants_stdout(&self) -> bool {
        false
    }

    fn stdout_line(
        &mut self,
        _ctx: &mut JobContext,
        _line: &str,
        _deferred: &mut DeferredError,
    ) -> Result<(), JobError> {
        Ok(())
    }

    fn stderr_line(
        &mut self,
        _ctx: &mut JobContext,
        _line: &str,
        _deferred: &mut DeferredError,
    ) -> Result<(), JobError> {
        Ok(())
    }

    /// Called once after the tool exited with status 0.
    fn post(&mut self, ctx: &mut JobContext) -> Result<PostAction, JobError> {
        ctx.finished_track()?;
        Ok(PostAction::Done)
    }

    fn on_error(&mut self, _ctx: &mut JobContext, _kind: ErrorKind) -> ErrorResponse {
        ErrorResponse::Propagate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pipe {
    Stdout,
    Stderr,
}

burner_core::simple_display! {
    Pipe {
        Stdout => "stdout",
        Stderr => "stderr",
    }
}

enum Chunk {
    Data(Pipe, Vec<u8>),
    Eof(Pipe),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    Open,
    Closed,
    /// Taken over by teardown
    Stopped,
}

/// Read end of a captured pipe, shared by its reader task and teardown.
struct PipeSource {
    which: Pipe,
    rx: pipe::Receiver,
    state: Mutex<ReadState>,
}

struct Reader {
    source: Arc<PipeSource>,
    task: JoinHandle<()>,
}

struct Running {
    child: tokio::process::Child,
    pgid: Pid,
    program: String,
    chunks: mpsc::UnboundedReceiver<Chunk>,
    chunk_tx: mpsc::UnboundedSender<Chunk>,
    readers: Vec<Reader>,
    stdout: LineSplitter,
    stderr: LineSplitter,
    open_pipes: usize,
    deferred: DeferredError,
    exit: Option<ExitStatus>,
}

pub struct Process<S> {
    spec: S,
    run: Option<Running>,
    /// Produced track count when the current run started
    produced_at_start: usize,
}

impl<S: ProcessSpec> Process<S> {
    pub fn new(spec: S) -> Self {
        Self { spec, run: None, produced_at_start: 0 }
    }

    pub fn spec(&self) -> &S {
        &self.spec
    }

    pub fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(|r| r.exit.is_none())
    }

    /// Process id of the running child.
    pub fn pid(&self) -> Option<u32> {
        self.run.as_ref().and_then(|r| r.child.id())
    }

    fn spawn(&mut self, ctx: &mut JobContext) -> Result<(), JobError> {
        let argv = self.spec.set_argv(ctx)?;
        let program = argv.program_name();
        let link = ctx.link()?;
        let mut cmd = argv.command();
        cmd.process_group(0).kill_on_drop(false);

        match ctx.input_fd()? {
            Some(fd) => cmd.stdin(Stdio::from(dup(&fd, &program)?)),
            None => cmd.stdin(Stdio::null()),
        };

        let (chunk_tx, chunks) = mpsc::unbounded_channel();
        let mut pipes = Vec::new();
        if let Some(fd) = ctx.output_fd()? {
            cmd.stdout(Stdio::from(dup(&fd, &program)?));
        } else if self.spec.wants_stdout() && ctx.is_last()? {
            let (read, write) = pipe(&program)?;
            cmd.stdout(Stdio::from(write));
            pipes.push((Pipe::Stdout, read));
        } else {
            cmd.stdout(Stdio::null());
        }
        let (read, write) = pipe(&program)?;
        cmd.stderr(Stdio::from(write));
        pipes.push((Pipe::Stderr, read));

        let child = cmd.spawn().map_err(|e| spawn_error(&program, &e))?;
        // The write ends left with `cmd` must close for readers to see EOF
        drop(cmd);

        let Some(pid) = child.id() else {
            return Err(JobError::new(ErrorKind::General, format!("{program} exited at once")));
        };
        let pgid = Pid::from_raw(pid as i32);
        ctx.log(&format!("launched {argv}"));
        tracing::info!(job = self.spec.name(), pid, "process started");

        let open_pipes = pipes.len();
        let mut readers = Vec::with_capacity(open_pipes);
        for (which, fd) in pipes {
            readers.push(spawn_reader(&program, which, fd, chunk_tx.clone(), link.clone())?);
        }

        self.produced_at_start = ctx.produced_tracks().len();
        self.run = Some(Running {
            child,
            pgid,
            program,
            chunks,
            chunk_tx,
            readers,
            stdout: LineSplitter::new(),
            stderr: LineSplitter::new(),
            open_pipes,
            deferred: DeferredError::default(),
            exit: None,
        });
        Ok(())
    }

    /// Hand every queued chunk to the line handlers, in arrival order.
    fn drain(&mut self, ctx: &mut JobContext) -> Result<(), JobError> {
        let Some(run) = self.run.as_mut() else {
            return Ok(());
        };
        loop {
            let Ok(chunk) = run.chunks.try_recv() else {
                return Ok(());
            };
            let (which, lines) = match chunk {
                Chunk::Data(which, bytes) => {
                    let splitter = match which {
                        Pipe::Stdout => &mut run.stdout,
                        Pipe::Stderr => &mut run.stderr,
                    };
                    (which, splitter.push(&bytes))
                }
                Chunk::Eof(which) => {
                    run.open_pipes = run.open_pipes.saturating_sub(1);
                    let splitter = match which {
                        Pipe::Stdout => &mut run.stdout,
                        Pipe::Stderr => &mut run.stderr,
                    };
                    (which, splitter.finish().into_iter().collect())
                }
            };
            for line in lines {
                ctx.log(&line);
                match which {
                    Pipe::Stdout => self.spec.stdout_line(ctx, &line, &mut run.deferred)?,
                    Pipe::Stderr => self.spec.stderr_line(ctx, &line, &mut run.deferred)?,
                }
            }
        }
    }

    /// Reap the child once both pipes closed.
    fn poll_exit(&mut self, ctx: &mut JobContext) -> Result<(), JobError> {
        let Some(run) = self.run.as_mut() else {
            return Ok(());
        };
        if run.exit.is_some() || run.open_pipes > 0 {
            return Ok(());
        }
        let status = match run.child.try_wait() {
            Ok(Some(status)) => status,
            Ok(None) => return Ok(()),
            Err(e) => return Err(JobError::io(format!("waiting for {}", run.program), &e)),
        };
        run.exit = Some(status);
        tracing::info!(job = self.spec.name(), %status, "process exited");

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            let error = match run.deferred.take() {
                Some(error) => error,
                None => BurnerError::exit_code(&run.program, code),
            };
            return ctx.error(error);
        }
        run.deferred.take();
        match self.spec.post(ctx)? {
            PostAction::Done => Ok(()),
            PostAction::Retry => {
                tracing::info!(job = self.spec.name(), "restarting process");
                self.teardown(ctx, false);
                self.spawn(ctx)
            }
        }
    }

    /// Kill, reap and drain. Returns whether the tool ran to a clean exit.
    fn teardown(&mut self, ctx: &mut JobContext, drain: bool) -> bool {
        let Some(mut run) = self.run.take() else {
            return false;
        };
        if run.exit.is_none() {
            terminate(&mut run);
        }
        for reader in run.readers.drain(..) {
            let was_open = {
                let mut state = reader.source.state.lock();
                let was_open = *state == ReadState::Open;
                *state = ReadState::Stopped;
                was_open
            };
            reader.task.abort();
            if was_open && drain {
                read_remaining(&reader.source, &run.chunk_tx);
            }
        }
        let clean = run.exit.is_some_and(|s| s.success());
        if drain {
            // Late lines may still carry an error worth reporting
            self.run = Some(run);
            if let Err(e) = self.drain(ctx) {
                tracing::debug!(job = self.spec.name(), error = %e, "error while draining output");
            }
            self.run = None;
        }
        clean
    }

    /// Describe the output when the tool wrote a single file and did not
    /// add a track itself.
    fn add_output_track(&mut self, ctx: &mut JobContext) -> Result<(), JobError> {
        if ctx.action() != burner_core::Action::Image
            || !ctx.is_last()?
            || ctx.output_fd()?.is_some()
            || !ctx.output_type().is_single_file()
        {
            return Ok(());
        }
        let kind = match ctx.output_type() {
            TrackType::Image(format) => {
                let (image, toc) = ctx.image_output()?;
                let len = file_len(&image)?;
                let mut track = ImageTrack::new(image, format).with_blocks_from_len(len);
                if let Some(toc) = toc.filter(|_| format != ImageFormat::Bin) {
                    track = track.toc(toc);
                }
                TrackKind::Image(track)
            }
            TrackType::Stream(format) => {
                let path = ctx.audio_output()?;
                let len = file_len(&path)?;
                TrackKind::Stream(
                    StreamTrack::new(uri::from_path(&path), format).end(stream::bytes_to_duration(len)),
                )
            }
            _ => return Ok(()),
        };
        let track = match ctx.current_track() {
            Ok(input) => input.derive(kind),
            Err(_) => Track::new(kind),
        };
        tracing::debug!(job = self.spec.name(), track = %track.id(), "adding output track");
        ctx.add_track(track)
    }
}

impl<S: ProcessSpec> Job for Process<S> {
    fn name(&self) -> &str {
        self.spec.name()
    }

    fn activate(&mut self, ctx: &mut JobContext) -> Result<Activation, JobError> {
        self.spec.activate(ctx)
    }

    fn start(&mut self, ctx: &mut JobContext) -> Result<Started, JobError> {
        if self.run.is_some() {
            return Ok(Started::Running);
        }
        self.spawn(ctx)?;
        Ok(Started::Running)
    }

    fn wake(&mut self, ctx: &mut JobContext) -> Result<(), JobError> {
        self.drain(ctx)
    }

    fn clock_tick(&mut self, ctx: &mut JobContext) -> Result<(), JobError> {
        self.drain(ctx)?;
        self.poll_exit(ctx)
    }

    fn stop(&mut self, ctx: &mut JobContext) -> Result<(), JobError> {
        if self.run.is_none() {
            return Ok(());
        }
        let clean = self.teardown(ctx, true);
        if clean && ctx.produced_tracks().len() == self.produced_at_start {
            self.add_output_track(ctx)?;
        }
        Ok(())
    }

    fn on_error(&mut self, ctx: &mut JobContext, kind: ErrorKind) -> ErrorResponse {
        self.spec.on_error(ctx, kind)
    }
}

impl<S> Drop for Process<S> {
    fn drop(&mut self) {
        if let Some(run) = self.run.as_mut() {
            if run.exit.is_none() {
                terminate(run);
            }
            for reader in &run.readers {
                reader.task.abort();
            }
        }
    }
}

/// SIGTERM the group, escalate to SIGKILL, and reap.
fn terminate(run: &mut Running) {
    match killpg(run.pgid, Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => {
            tracing::warn!(program = %run.program, error = %e, "SIGTERM failed, sending SIGKILL");
            let _ = killpg(run.pgid, Signal::SIGKILL);
        }
    }
    if let Some(status) = wait_for(&mut run.child, TERM_GRACE) {
        run.exit = Some(status);
        return;
    }
    tracing::warn!(program = %run.program, "process ignored SIGTERM, sending SIGKILL");
    let _ = killpg(run.pgid, Signal::SIGKILL);
    run.exit = wait_for(&mut run.child, TERM_GRACE);
    if run.exit.is_none() {
        tracing::warn!(program = %run.program, "process survived SIGKILL");
    }
}

fn wait_for(child: &mut tokio::process::Child, grace: Duration) -> Option<ExitStatus> {
    let deadline = Instant::now() + grace;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) if Instant::now() < deadline => std::thread::sleep(POLL_STEP),
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(error = %e, "wait failed");
                return None;
            }
        }
    }
}

fn spawn_reader(
    program: &str,
    which: Pipe,
    fd: OwnedFd,
    tx: mpsc::UnboundedSender<Chunk>,
    link: JobLink,
) -> Result<Reader, JobError> {
    let rx = pipe::Receiver::from_owned_fd(fd)
        .map_err(|e| JobError::io(format!("cannot read {program} {which}"), &e))?;
    let source = Arc::new(PipeSource { which, rx, state: Mutex::new(ReadState::Open) });
    let task = tokio::spawn(read_pipe(source.clone(), tx, link));
    Ok(Reader { source, task })
}

async fn read_pipe(source: Arc<PipeSource>, tx: mpsc::UnboundedSender<Chunk>, link: JobLink) {
    let which = source.which;
    let mut buf = [0u8; 4096];
    loop {
        if let Err(e) = source.rx.readable().await {
            tracing::debug!(pipe = %which, error = %e, "pipe poll failed");
        }
        {
            let mut state = source.state.lock();
            if *state != ReadState::Open {
                return;
            }
            match source.rx.try_read(&mut buf) {
                Ok(0) => {
                    *state = ReadState::Closed;
                    let _ = tx.send(Chunk::Eof(which));
                }
                Ok(n) => {
                    let _ = tx.send(Chunk::Data(which, buf[..n].to_vec()));
                }
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
                    continue;
                }
                Err(e) => {
                    tracing::debug!(pipe = %which, error = %e, "pipe read failed");
                    *state = ReadState::Closed;
                    let _ = tx.send(Chunk::Eof(which));
                }
            }
        }
        link.wake();
    }
}

/// Queue whatever is already buffered in a pipe whose reader was stopped.
///
/// Reads the descriptor directly: the reactor may not have seen it become
/// readable yet. The descriptor is non-blocking, so this stops at the first
/// read that would block.
fn read_remaining(source: &PipeSource, tx: &mpsc::UnboundedSender<Chunk>) {
    let mut buf = [0u8; 4096];
    loop {
        match nix::unistd::read(source.rx.as_raw_fd(), &mut buf) {
            Ok(0) => break,
            Ok(n) => {
                let _ = tx.send(Chunk::Data(source.which, buf[..n].to_vec()));
            }
            Err(Errno::EINTR) => continue,
            Err(_) => break,
        }
    }
    let _ = tx.send(Chunk::Eof(source.which));
}

fn pipe(program: &str) -> Result<(OwnedFd, OwnedFd), JobError> {
    nix::unistd::pipe2(OFlag::O_CLOEXEC).map_err(|e| {
        JobError::io(format!("cannot create a pipe for {program}"), &std::io::Error::from(e))
    })
}

fn dup(fd: &std::os::fd::BorrowedFd<'_>, program: &str) -> Result<OwnedFd, JobError> {
    fd.try_clone_to_owned()
        .map_err(|e| JobError::io(format!("cannot duplicate a pipe for {program}"), &e))
}

fn spawn_error(program: &str, err: &std::io::Error) -> JobError {
    if err.kind() == std::io::ErrorKind::NotFound {
        JobError::new(
            ErrorKind::MissingAppAndPlugin,
            format!("\"{program}\" could not be found in the path"),
        )
    } else {
        JobError::io(format!("cannot start \"{program}\""), err)
    }
}

fn file_len(path: &std::path::Path) -> Result<u64, JobError> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| JobError::io(format!("cannot read {}", path.display()), &e))
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
