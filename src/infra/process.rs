//! External process invocation
//!
//! All external tools (git, tar, rpmbuild, mock, koji, git-annex) are
//! driven through [`CommandLine`]: a program plus a structured argument
//! vector, never a shell string. Invocations block until the child
//! exits and capture stdout/stderr for diagnosis.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// External process errors
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The program could not be started at all
    #[error("Failed to run '{program}': {error}")]
    SpawnFailed { program: String, error: String },

    /// The program ran and exited non-zero
    #[error("'{command}' exited with {code}:\n{stderr}")]
    ExitFailure {
        command: String,
        code: i32,
        stdout: String,
        stderr: String,
    },
}

/// Captured result of a completed invocation
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Process exit code
    pub code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

/// A single external command invocation
#[derive(Debug, Clone)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl CommandLine {
    /// Create a new command for `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Append a single argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the child from `dir` instead of the current directory
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Render the invocation for error messages and debug logs
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    /// Run to completion, failing on a non-zero exit
    pub fn run(&self) -> Result<CommandOutput, ProcessError> {
        let output = self.run_unchecked()?;
        if output.code != 0 {
            return Err(ProcessError::ExitFailure {
                command: self.display(),
                code: output.code,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }

    /// Run to completion, returning the exit code to the caller
    ///
    /// Used for probes where a non-zero exit is an answer, not an error.
    pub fn run_unchecked(&self) -> Result<CommandOutput, ProcessError> {
        tracing::debug!("Running: {}", self.display());

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|e| ProcessError::SpawnFailed {
            program: self.program.clone(),
            error: e.to_string(),
        })?;

        Ok(CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Check whether `program` is present on the PATH
pub fn tool_available(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Convenience wrapper: run `program` with `args` in `dir`
pub fn run_in(
    dir: &Path,
    program: &str,
    args: &[&str],
) -> Result<CommandOutput, ProcessError> {
    CommandLine::new(program)
        .args(args.iter().copied().map(String::from))
        .current_dir(dir)
        .run()
}
