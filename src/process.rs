//! Centralized command execution with consistent error handling.
//!
//! `Cmd` describes one external invocation. Build steps are executed through
//! the [`Runner`] trait so the orchestrator can be driven by the real system
//! or by a recording runner in tests.

use anyhow::{bail, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use crate::error::BuildError;

/// Result of a captured command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit status of the command.
    pub status: ExitStatus,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl CommandResult {
    /// Returns true if the command exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Get the exit code, or -1 if terminated by signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    /// Get stderr, trimmed of whitespace.
    pub fn stderr_trimmed(&self) -> &str {
        self.stderr.trim()
    }
}

/// An external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Set the working directory.
    pub fn dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> BuildError {
        BuildError::ToolNotFound {
            program: self.program.clone(),
            source,
        }
    }

    /// Run the command and capture output.
    pub fn run(&self) -> Result<CommandResult> {
        let output = self
            .command()
            .output()
            .map_err(|e| self.spawn_error(e))?;

        let result = CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success() {
            let err = BuildError::ToolFailed {
                program: self.program.clone(),
                code: result.code(),
            };
            let stderr = result.stderr_trimmed();
            if stderr.is_empty() {
                return Err(err.into());
            }
            return Err(anyhow::Error::from(err).context(stderr.to_string()));
        }

        Ok(result)
    }

    /// Run the command with inherited stdio.
    ///
    /// Output goes directly to the terminal, so the tool's own diagnostics
    /// are what the user sees on failure.
    pub fn run_interactive(&self) -> Result<ExitStatus> {
        let mut cmd = self.command();
        cmd.stdin(Stdio::inherit());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        let status = cmd.status().map_err(|e| self.spawn_error(e))?;

        if !status.success() {
            return Err(BuildError::ToolFailed {
                program: self.program.clone(),
                code: status.code().unwrap_or(-1),
            }
            .into());
        }

        Ok(status)
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dir) = &self.current_dir {
            if dir != Path::new(".") {
                write!(f, "(cd {}) ", dir.display())?;
            }
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Runners
// =============================================================================

/// Executes external invocations on behalf of the orchestrator.
pub trait Runner {
    fn run(&mut self, cmd: &Cmd) -> Result<()>;
}

/// Runs commands on the host with inherited stdio.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&mut self, cmd: &Cmd) -> Result<()> {
        tracing::debug!(command = %cmd, "spawning");
        let status = cmd.run_interactive()?;
        tracing::debug!(program = cmd.program(), code = ?status.code(), "exited");
        Ok(())
    }
}

/// Records every invocation instead of running it.
///
/// Commands whose rendered line contains a registered needle fail with the
/// given exit code, after being recorded.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Vec<Cmd>,
    failures: Vec<(String, i32)>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any command whose rendered line contains `needle`.
    pub fn fail_on(mut self, needle: impl Into<String>, code: i32) -> Self {
        self.failures.push((needle.into(), code));
        self
    }

    pub fn calls(&self) -> &[Cmd] {
        &self.calls
    }

    /// Rendered command lines, in call order.
    pub fn lines(&self) -> Vec<String> {
        self.calls.iter().map(|c| c.to_string()).collect()
    }
}

impl Runner for RecordingRunner {
    fn run(&mut self, cmd: &Cmd) -> Result<()> {
        self.calls.push(cmd.clone());
        let line = cmd.to_string();
        if let Some((_, code)) = self.failures.iter().find(|(n, _)| line.contains(n.as_str())) {
            bail!(BuildError::ToolFailed {
                program: cmd.program().to_string(),
                code: *code,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Convenience functions
// =============================================================================

/// Check if a program exists in PATH.
///
/// Returns the full path if found, None otherwise.
pub fn which(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}

/// Check if a program exists in PATH (bool version).
pub fn exists(program: &str) -> bool {
    which(program).is_some()
}

// =============================================================================
// Tests
// =============================================================================
