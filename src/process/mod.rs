//! External process execution
//!
//! Runs exactly one child process per call with piped stdio and hands back
//! its exit code and captured output streams.


use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Exit code reported when the platform gives none (signal termination)
pub const UNKNOWN_EXIT_CODE: i32 = -1;

/// Errors raised when a child process cannot be run to completion
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to start process '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Failed to collect output of process '{program}': {source}")]
    Wait {
        program: String,
        source: std::io::Error,
    },
}

/// A program invocation expressed as an argument vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: OsString,
    args: Vec<OsString>,
    working_dir: Option<PathBuf>,
    env: BTreeMap<OsString, OsString>,
}

impl CommandLine {
    #[inline]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[inline]
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set an environment variable on top of the inherited environment
    #[inline]
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn program(&self) -> &OsString {
        &self.program
    }

    #[inline]
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    #[inline]
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    #[inline]
    pub fn envs(&self) -> &BTreeMap<OsString, OsString> {
        &self.env
    }

    /// Human readable rendering for logs
    #[inline]
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit code and captured output of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    #[inline]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes command lines on behalf of tools
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &CommandLine) -> Result<ProcessOutput, ProcessError>;
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    #[inline]
    async fn run(&self, command: &CommandLine) -> Result<ProcessOutput, ProcessError> {
        let program = command.program.to_string_lossy().into_owned();
        debug!("Running process: {}", command.display());

        let mut process = Command::new(&command.program);
        process
            .args(&command.args)
            .envs(&command.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &command.working_dir {
            process.current_dir(dir);
        }

        let mut child = process.spawn().map_err(|source| ProcessError::Spawn {
            program: program.clone(),
            source,
        })?;

        // Nothing is ever written to the child
        drop(child.stdin.take());

        // Drains stdout and stderr concurrently before reaping the child
        let output = child
            .wait_with_output()
            .await
            .map_err(|source| ProcessError::Wait { program, source })?;

        Ok(ProcessOutput {
            exit_code: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        match status.signal() {
            Some(signal) => warn!("Process terminated by signal {}", signal),
            None => warn!("Process terminated without an exit code"),
        }
    }
    #[cfg(not(unix))]
    warn!("Process terminated without an exit code");

    UNKNOWN_EXIT_CODE
}
