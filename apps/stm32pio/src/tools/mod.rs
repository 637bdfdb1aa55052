//! # External Tools
//!
//! Subprocess plumbing shared by every tool wrapper.
//!
//! Each line a child writes becomes a tracing event on the
//! `stm32pio::subprocess` target with `tool` and `stream` fields. Lines are
//! shown at `info` in verbose mode and at `debug` otherwise; a failed run in
//! quiet mode replays what it captured at `warn` so the cause is not lost.

pub mod cubemx;
pub mod editor;
pub mod git;
pub mod platformio;
pub mod validate;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use stm32pio_core::Stm32pioError;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Target all forwarded subprocess lines are logged under.
pub const SUBPROCESS_TARGET: &str = "stm32pio::subprocess";

// =============================================================================
// INVOCATION
// =============================================================================

/// A command line to run, with the human-readable name of the tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    tool: String,
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(tool: impl Into<String>, program: impl Into<OsString>) -> Self {
        Self {
            tool: tool.into(),
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append `arg` only when `condition` holds.
    #[must_use]
    pub fn arg_if(self, condition: bool, arg: impl Into<OsString>) -> Self {
        if condition { self.arg(arg) } else { self }
    }

    #[must_use]
    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    #[must_use]
    pub fn tool(&self) -> &str {
        &self.tool
    }

    #[must_use]
    pub fn program(&self) -> &OsString {
        &self.program
    }

    #[must_use]
    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    /// Shell-like rendering for logs.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|part| part.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

/// Which pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

/// What a finished child left behind.
#[derive(Debug)]
pub struct ToolOutput {
    tool: String,
    status: ExitStatus,
    stdout: Vec<String>,
    stderr: Vec<String>,
}

impl ToolOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.success()
    }

    #[must_use]
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    #[must_use]
    pub fn stdout(&self) -> &[String] {
        &self.stdout
    }

    #[must_use]
    pub fn stderr(&self) -> &[String] {
        &self.stderr
    }

    /// Every captured line, stdout first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout
            .iter()
            .chain(self.stderr.iter())
            .map(String::as_str)
    }

    /// Error out on a non-zero exit status.
    ///
    /// When the lines were only logged at `debug`, they are replayed at
    /// `warn` first.
    pub fn ensure_success(self, verbose: bool) -> Result<Self, Stm32pioError> {
        if self.success() {
            return Ok(self);
        }
        if !verbose {
            self.replay();
        }
        let reason = match self.code() {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by a signal".to_string(),
        };
        Err(Stm32pioError::tool(self.tool, reason))
    }

    fn replay(&self) {
        for (stream, lines) in [(Stream::Stdout, &self.stdout), (Stream::Stderr, &self.stderr)] {
            for line in lines {
                tracing::warn!(
                    target: SUBPROCESS_TARGET,
                    tool = %self.tool,
                    stream = stream.as_str(),
                    "{}",
                    line
                );
            }
        }
    }
}

// =============================================================================
// RUNNER
// =============================================================================

/// Run `invocation` to completion, forwarding its output into tracing.
///
/// Only a failure to start the child is an error here; the exit status is
/// left to the caller (see [`ToolOutput::ensure_success`]).
pub async fn run_tool(invocation: &Invocation, verbose: bool) -> Result<ToolOutput, Stm32pioError> {
    tracing::debug!("Running {}", invocation.command_line());

    let mut command = Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = &invocation.cwd {
        command.current_dir(cwd);
    }

    let mut child = command.spawn().map_err(|e| {
        Stm32pioError::tool(
            invocation.tool.clone(),
            format!("cannot start {:?}: {}", invocation.program, e),
        )
    })?;

    let stdout = child.stdout.take().ok_or_else(|| {
        Stm32pioError::tool(invocation.tool.clone(), "failed to capture stdout")
    })?;
    let stderr = child.stderr.take().ok_or_else(|| {
        Stm32pioError::tool(invocation.tool.clone(), "failed to capture stderr")
    })?;

    let stdout_handle = forward(stdout, invocation.tool.clone(), Stream::Stdout, verbose);
    let stderr_handle = forward(stderr, invocation.tool.clone(), Stream::Stderr, verbose);

    let status = child.wait().await.map_err(|e| {
        Stm32pioError::tool(invocation.tool.clone(), format!("wait failed: {}", e))
    })?;
    let stdout = collect(stdout_handle, &invocation.tool, Stream::Stdout).await;
    let stderr = collect(stderr_handle, &invocation.tool, Stream::Stderr).await;

    tracing::debug!("{} finished: {}", invocation.tool, status);

    Ok(ToolOutput {
        tool: invocation.tool.clone(),
        status,
        stdout,
        stderr,
    })
}

/// Read `pipe` line by line in its own task, logging and collecting each line.
///
/// Bytes that are not UTF-8 are replaced rather than ending the read, so the
/// pipe is always drained to EOF.
fn forward<R>(pipe: R, tool: String, stream: Stream, verbose: bool) -> JoinHandle<Vec<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        let mut log = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("{} {} read failed: {}", tool, stream.as_str(), e);
                    break;
                }
            }
            while matches!(buf.last(), Some(b'\n' | b'\r')) {
                buf.pop();
            }
            let line = String::from_utf8_lossy(&buf).into_owned();
            if verbose {
                tracing::info!(target: SUBPROCESS_TARGET, tool = %tool, stream = stream.as_str(), "{}", line);
            } else {
                tracing::debug!(target: SUBPROCESS_TARGET, tool = %tool, stream = stream.as_str(), "{}", line);
            }
            log.push(line);
        }
        log
    })
}

/// Wait for a reader task. A reader that died leaves an empty capture.
async fn collect(handle: JoinHandle<Vec<String>>, tool: &str, stream: Stream) -> Vec<String> {
    match handle.await {
        Ok(lines) => lines,
        Err(e) => {
            tracing::warn!("{} {} reader failed: {}", tool, stream.as_str(), e);
            Vec::new()
        }
    }
}
