//! Spawning external tools and locating them on PATH.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result};

/// Output of a finished process.
#[derive(Debug, Clone)]
pub struct Captured {
    /// Exit status
    pub status: ExitStatus,
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
}

impl Captured {
    /// Whether the process exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Builder for a subprocess whose output is captured.
#[derive(Debug)]
pub struct ProcessBuilder {
    program: PathBuf,
    command: Command,
}

impl ProcessBuilder {
    /// Start building an invocation of `program`.
    pub fn new(program: impl AsRef<Path>) -> Self {
        let program = program.as_ref().to_path_buf();
        let mut command = Command::new(&program);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        ProcessBuilder { program, command }
    }

    /// Append arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command.args(args);
        self
    }

    /// Run from `dir` instead of the current directory.
    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.command.current_dir(dir);
        self
    }

    /// Run to completion. A non-zero exit is not an error here; only a failure
    /// to spawn is.
    pub fn capture(mut self) -> Result<Captured> {
        let output = self
            .command
            .output()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        Ok(Captured {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Pick a program name: the value of `env_var` if set, otherwise the first
/// candidate found in PATH.
pub fn find_program(env_var: &str, candidates: &[&str]) -> Option<String> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.trim().is_empty() {
            return Some(value);
        }
    }

    candidates
        .iter()
        .find(|name| find_executable(name).is_some())
        .map(|name| name.to_string())
}
