// crates/tenantdb-docker/src/command.rs
// ============================================================================
// Module: Command Runner
// Description: Child process execution with captured output and a deadline.
// Purpose: Keep Docker CLI calls bounded and substitutable in tests.
// Dependencies: std
// ============================================================================

//! ## Overview
//! An [`Invocation`] is a program, its argv, extra environment variables, and
//! a timeout. Arguments are passed directly to the child, never through a
//! shell. [`ProcessRunner`] drains stdout and stderr on helper threads while
//! polling the child, and kills it once the deadline passes. A failed kill or
//! reap is carried in the timeout error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::io::Read;
use std::process::Child;
use std::process::Command;
use std::process::Stdio;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Interval between child status polls.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// SECTION: Types
// ============================================================================

/// A single external command.
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to execute.
    pub program: String,
    /// Arguments passed verbatim.
    pub args: Vec<String>,
    /// Extra environment variables for the child.
    pub envs: Vec<(String, String)>,
    /// Wall-clock limit.
    pub timeout: Duration,
}

impl Invocation {
    /// Creates an invocation with no extra environment.
    #[must_use]
    pub fn new(program: &str, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            args,
            envs: Vec::new(),
            timeout,
        }
    }

    /// Adds an environment variable for the child.
    #[must_use]
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env_keys: Vec<&str> = self.envs.iter().map(|(key, _)| key.as_str()).collect();
        f.debug_struct("Invocation")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("env_keys", &env_keys)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// True when the command exited with status zero.
    pub success: bool,
    /// Exit code, absent when terminated by a signal.
    pub code: Option<i32>,
    /// Captured stdout (lossy utf-8).
    pub stdout: String,
    /// Captured stderr (lossy utf-8).
    pub stderr: String,
}

impl CommandOutput {
    /// Returns stderr when present, otherwise stdout, trimmed.
    #[must_use]
    pub fn diagnostic(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() { self.stdout.trim() } else { stderr }
    }
}

/// Failures that prevent a command from producing output.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The program could not be started.
    #[error("failed to start {0}")]
    Spawn(String),
    /// The program ran past its deadline and was killed.
    #[error("timed out after {millis}ms{}", cleanup_note(.cleanup.as_deref()))]
    TimedOut {
        /// The deadline that passed.
        millis: u128,
        /// Why the child could not be killed or reaped, when that failed.
        cleanup: Option<String>,
    },
    /// Waiting on the child or reading its output failed.
    #[error("command io error: {0}")]
    Io(String),
}

/// Executes invocations.
pub trait CommandRunner {
    /// Runs the invocation to completion or until its timeout.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the command cannot start, times out, or
    /// its output cannot be collected. A nonzero exit is not an error here.
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError>;
}

// ============================================================================
// SECTION: Process Runner
// ============================================================================

/// Runs invocations as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        cmd.envs(invocation.envs.iter().map(|(key, value)| (key.as_str(), value.as_str())));
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        let mut child = cmd
            .spawn()
            .map_err(|err| CommandError::Spawn(format!("{}: {err}", invocation.program)))?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let status = match wait_with_deadline(&mut child, invocation.timeout) {
            Ok(status) => status,
            Err(err) => {
                // A grandchild can hold the pipes open past the kill; detach the readers.
                drop(stdout);
                drop(stderr);
                return Err(err);
            }
        };
        Ok(CommandOutput {
            success: status.success(),
            code: status.code(),
            stdout: collect(stdout)?,
            stderr: collect(stderr)?,
        })
    }
}

/// Reads a pipe to completion on a helper thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<std::io::Result<Vec<u8>>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

/// Joins a drain thread and decodes its bytes.
fn collect(handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> Result<String, CommandError> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| CommandError::Io("output reader panicked".to_string()))?
        .map_err(|err| CommandError::Io(err.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Polls the child until it exits, killing it at the deadline.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
) -> Result<std::process::ExitStatus, CommandError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().map_err(|err| CommandError::Io(err.to_string()))? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let killed = child.kill();
            let reaped = killed.is_ok().then(|| child.wait());
            return Err(timed_out(timeout, killed, reaped));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Builds the timeout error, keeping any kill or reap failure.
fn timed_out(
    timeout: Duration,
    killed: std::io::Result<()>,
    reaped: Option<std::io::Result<std::process::ExitStatus>>,
) -> CommandError {
    let cleanup = match (killed, reaped) {
        (Err(err), _) => Some(format!("kill failed: {err}")),
        (Ok(()), Some(Err(err))) => Some(format!("wait failed: {err}")),
        (Ok(()), _) => None,
    };
    CommandError::TimedOut {
        millis: timeout.as_millis(),
        cleanup,
    }
}

/// Renders the cleanup suffix of a timeout message.
fn cleanup_note(cleanup: Option<&str>) -> String {
    cleanup.map_or_else(String::new, |detail| format!(" ({detail})"))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
