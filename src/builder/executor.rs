//! Build executor with progress reporting.
//!
//! Groups run strictly in order. The actions of one group run concurrently on
//! a rayon pool; when any of them fails, its siblings are allowed to finish,
//! no later group starts, the plan's cleanup group runs best effort and the
//! first failure is returned.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use miette::Diagnostic as MietteDiagnostic;
use rayon::prelude::*;
use thiserror::Error;

use crate::builder::plan::{Action, ActionGroup, BuildPlan};
use crate::builder::toolchain::CommandSpec;
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists};
use crate::util::process::ProcessBuilder;

/// A failed external command.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ExecError {
    #[error("command failed with {status}: {command}\n{stderr}")]
    #[diagnostic(code(gantry::exec::command_failed))]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
}

impl ExecError {
    /// Convert to a user-facing diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ExecError::CommandFailed {
                command,
                status,
                stderr,
            } => {
                let mut diag = Diagnostic::error(format!("command failed with {}", status))
                    .with_note(command.clone());
                if !stderr.trim().is_empty() {
                    diag = diag.with_note(stderr.trim_end().to_string());
                }
                diag.with_help(suggestions::BUILD_FAILED)
            }
        }
    }
}

/// Runs the external commands of a plan.
pub trait CommandRunner: Send + Sync {
    /// Run `command`, which is expected to produce `output`.
    fn run(&self, command: &CommandSpec, output: &Path) -> Result<()>;
}

/// Spawns real processes from a fixed working directory.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    cwd: PathBuf,
}

impl ProcessRunner {
    /// Create a runner spawning commands in `cwd`.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        ProcessRunner { cwd: cwd.into() }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &CommandSpec, output: &Path) -> Result<()> {
        tracing::debug!("running {}", command);
        let result = ProcessBuilder::new(&command.program)
            .args(&command.args)
            .cwd(&self.cwd)
            .capture()?;

        if !result.success() {
            return Err(ExecError::CommandFailed {
                command: command.to_string(),
                status: result.status.to_string(),
                stderr: result.stderr,
            }
            .into());
        }

        tracing::debug!("produced {}", output.display());
        Ok(())
    }
}

/// What a successful run did.
#[derive(Debug, Clone, Default)]
pub struct ExecSummary {
    /// External commands run
    pub commands: usize,
    /// Linked outputs produced
    pub artifacts: Vec<PathBuf>,
}

/// Build executor with progress tracking.
pub struct BuildExecutor<'a, R: CommandRunner> {
    runner: &'a R,
    root: PathBuf,
    jobs: Option<usize>,
    verbose: bool,
}

impl<'a, R: CommandRunner> BuildExecutor<'a, R> {
    /// Create an executor resolving in-process filesystem actions under `root`.
    pub fn new(runner: &'a R, root: impl Into<PathBuf>) -> Self {
        BuildExecutor {
            runner,
            root: root.into(),
            jobs: None,
            verbose: false,
        }
    }

    /// Limit concurrency within a group.
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Enable verbose output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Execute a build plan with progress reporting.
    pub fn execute(&self, plan: &BuildPlan) -> Result<ExecSummary> {
        let start = Instant::now();

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(jobs) = self.jobs {
            builder = builder.num_threads(jobs);
        }
        let pool = builder.build().context("failed to start build thread pool")?;

        if self.verbose {
            eprintln!("   Compiling {} file(s)", plan.compile_count());
            eprintln!("     Linking {} target(s)", plan.link_count());
        }

        let total = plan.command_count();
        let pb = if !self.verbose && total > 1 {
            let pb = ProgressBar::new(total as u64);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .map(|s| s.progress_chars("#>-"))
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            pb.set_style(style);
            Some(pb)
        } else {
            None
        };

        let mut summary = ExecSummary::default();
        for group in plan.work_groups() {
            if let Err(err) = pool.install(|| self.run_group(group, pb.as_ref())) {
                if let Some(pb) = &pb {
                    pb.abandon();
                }
                self.cleanup_after_failure(plan);
                return Err(err);
            }

            summary.commands += group.command_count();
            summary.artifacts.extend(group.actions.iter().filter_map(|a| match a {
                Action::Link(step) => Some(step.output.clone()),
                _ => None,
            }));
        }

        if let Some(cleanup) = plan.cleanup() {
            self.run_group(cleanup, None)?;
        }

        if let Some(pb) = pb {
            pb.finish_with_message("done");
        }

        tracing::info!(
            "finished {} command(s) in {:.2}s",
            summary.commands,
            start.elapsed().as_secs_f64()
        );
        Ok(summary)
    }

    fn run_group(&self, group: &ActionGroup, pb: Option<&ProgressBar>) -> Result<()> {
        let results: Vec<Result<()>> = group
            .actions
            .par_iter()
            .map(|action| {
                let result = self.run_action(action);
                if let (Some(pb), Some(output)) = (pb, action.output()) {
                    pb.set_message(output.display().to_string());
                    pb.inc(1);
                }
                result
            })
            .collect();

        results.into_iter().collect()
    }

    fn run_action(&self, action: &Action) -> Result<()> {
        match action {
            Action::CreateDir { path } => ensure_dir(&self.root.join(path)),
            Action::Remove { paths } => {
                for path in paths {
                    let full = self.root.join(path);
                    if full.is_file() {
                        std::fs::remove_file(&full)
                            .with_context(|| format!("failed to remove {}", full.display()))?;
                    } else {
                        remove_dir_all_if_exists(&full)?;
                    }
                }
                Ok(())
            }
            Action::Precompile(step) | Action::Compile(step) => {
                if self.verbose {
                    eprintln!("{}", step.command);
                }
                self.runner.run(&step.command, &step.output)
            }
            Action::Link(step) => {
                if self.verbose {
                    eprintln!("{}", step.command);
                }
                tracing::info!("linking {} {}", step.kind, step.output.display());
                self.runner.run(&step.command, &step.output)
            }
        }
    }

    fn cleanup_after_failure(&self, plan: &BuildPlan) {
        let Some(cleanup) = plan.cleanup() else {
            return;
        };
        for action in &cleanup.actions {
            if let Err(err) = self.run_action(action) {
                tracing::warn!("cleanup after failed build did not complete: {:#}", err);
            }
        }
    }
}
