//! Build plan data.
//!
//! A [`BuildPlan`] is an ordered list of [`ActionGroup`]s. Actions inside one
//! group are independent of each other; a group may only start once every
//! earlier group has finished. Groups always come in this order: directory
//! setup, one group per scheduled step that has work, links, cleanup.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::builder::toolchain::{shell_quote, CommandSpec};
use crate::util::fs::write_string;

/// What a group of actions is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// Create output directories
    Setup,
    /// Compile one scheduler step
    Compile {
        /// Index of the step in the schedule
        step: usize,
    },
    /// Produce the requested outputs
    Link,
    /// Remove intermediate state
    Cleanup,
}

/// Kind of linked output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    StaticLib,
    SharedLib,
    Executable,
}

impl OutputKind {
    /// File name of an output called `name`.
    pub fn file_name(&self, name: &str) -> String {
        match self {
            OutputKind::StaticLib => format!("lib{}.a", name),
            OutputKind::SharedLib => format!("lib{}.so", name),
            OutputKind::Executable => name.to_string(),
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputKind::StaticLib => "static library",
            OutputKind::SharedLib => "shared library",
            OutputKind::Executable => "executable",
        })
    }
}

/// A step that turns one source into one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileStep {
    /// Source file
    pub source: PathBuf,
    /// Object file
    pub output: PathBuf,
    /// Command producing `output`
    pub command: CommandSpec,
}

/// A step that combines objects into an output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkStep {
    /// What is produced
    pub kind: OutputKind,
    /// Objects consumed, in link order
    pub objects: Vec<PathBuf>,
    /// Produced file
    pub output: PathBuf,
    /// Command producing `output`
    pub command: CommandSpec,
}

/// A single unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// `mkdir -p`
    CreateDir {
        /// Directory to create
        path: PathBuf,
    },
    /// Precompile a header-unit
    Precompile(CompileStep),
    /// Compile a translation unit
    Compile(CompileStep),
    /// Archive or link objects
    Link(LinkStep),
    /// `rm -r`
    Remove {
        /// Files or directories to remove
        paths: Vec<PathBuf>,
    },
}

impl Action {
    /// External command run by this action, if any.
    pub fn command(&self) -> Option<&CommandSpec> {
        match self {
            Action::Precompile(step) | Action::Compile(step) => Some(&step.command),
            Action::Link(step) => Some(&step.command),
            Action::CreateDir { .. } | Action::Remove { .. } => None,
        }
    }

    /// File produced by this action's command, if any.
    pub fn output(&self) -> Option<&Path> {
        match self {
            Action::Precompile(step) | Action::Compile(step) => Some(step.output.as_path()),
            Action::Link(step) => Some(step.output.as_path()),
            Action::CreateDir { .. } | Action::Remove { .. } => None,
        }
    }

    /// Shell text equivalent of this action.
    pub fn shell_text(&self) -> String {
        match self {
            Action::CreateDir { path } => {
                format!("mkdir -p {}", shell_quote(&path.display().to_string()))
            }
            Action::Remove { paths } => {
                let paths: Vec<String> = paths
                    .iter()
                    .map(|p| shell_quote(&p.display().to_string()))
                    .collect();
                format!("rm -r {}", paths.join(" "))
            }
            _ => self
                .command()
                .map(CommandSpec::to_string)
                .unwrap_or_default(),
        }
    }
}

/// Independent actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionGroup {
    /// What the group is for
    #[serde(flatten)]
    pub phase: Phase,
    /// Actions, sorted by their shell text within compile groups
    pub actions: Vec<Action>,
}

impl ActionGroup {
    /// Create an empty group.
    pub fn new(phase: Phase) -> Self {
        ActionGroup {
            phase,
            actions: Vec::new(),
        }
    }

    /// Number of external commands in the group.
    pub fn command_count(&self) -> usize {
        self.actions.iter().filter(|a| a.command().is_some()).count()
    }
}

/// A complete build plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    /// Groups in execution order
    pub groups: Vec<ActionGroup>,
    /// Every object linked into the outputs, including reused ones
    pub objects: Vec<PathBuf>,
    /// Compiles skipped because their object is up to date
    pub fresh: usize,
}

impl BuildPlan {
    /// Groups that run before cleanup.
    pub fn work_groups(&self) -> impl Iterator<Item = &ActionGroup> {
        self.groups.iter().filter(|g| g.phase != Phase::Cleanup)
    }

    /// The cleanup group, if intermediates are not kept.
    pub fn cleanup(&self) -> Option<&ActionGroup> {
        self.groups.iter().find(|g| g.phase == Phase::Cleanup)
    }

    /// All actions, in order.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.groups.iter().flat_map(|g| g.actions.iter())
    }

    /// Number of compile and precompile actions.
    pub fn compile_count(&self) -> usize {
        self.actions()
            .filter(|a| matches!(a, Action::Compile(_) | Action::Precompile(_)))
            .count()
    }

    /// Number of link actions.
    pub fn link_count(&self) -> usize {
        self.actions()
            .filter(|a| matches!(a, Action::Link(_)))
            .count()
    }

    /// Number of external commands across all groups.
    pub fn command_count(&self) -> usize {
        self.groups.iter().map(ActionGroup::command_count).sum()
    }

    /// Shell text of the plan: one line per action, a blank line after each
    /// group.
    pub fn shell_text(&self) -> String {
        let mut out = String::new();
        for group in &self.groups {
            for action in &group.actions {
                out.push_str(&action.shell_text());
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    /// `compile_commands.json` entries for every compile action.
    pub fn compile_commands(&self, directory: &Path) -> Vec<CompileCommand> {
        self.actions()
            .filter_map(|action| match action {
                Action::Compile(step) | Action::Precompile(step) => Some(step),
                _ => None,
            })
            .map(|step| CompileCommand {
                directory: directory.display().to_string(),
                file: step.source.display().to_string(),
                arguments: step.command.argv(),
                output: Some(step.output.display().to_string()),
            })
            .collect()
    }

    /// Emit compile_commands.json for IDE integration.
    pub fn emit_compile_commands(&self, directory: &Path, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.compile_commands(directory))?;
        write_string(path, &json)
    }
}

/// compile_commands.json entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileCommand {
    pub directory: String,
    pub file: String,
    pub arguments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}
