//! Dependency graph error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::ModuleName;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Fatal error while building or ordering the dependency graph.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum GraphError {
    #[error("dependency cycle between {} file(s)", .files.len())]
    #[diagnostic(code(gantry::graph::cycle))]
    Cycle {
        /// Files on the cycle, in dependency order, first file repeated last
        files: Vec<PathBuf>,
    },

    #[error("module `{name}` is defined more than once")]
    #[diagnostic(code(gantry::graph::duplicate_module))]
    DuplicateModule {
        name: ModuleName,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("failed to read source file: {}", .path.display())]
    #[diagnostic(code(gantry::graph::unreadable))]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GraphError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            GraphError::Cycle { files } => {
                let chain: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
                Diagnostic::error(self.to_string())
                    .with_note(format!("cycle: {}", chain.join(" -> ")))
                    .with_help(suggestions::BREAK_CYCLE)
            }
            GraphError::DuplicateModule {
                name,
                first,
                second,
            } => Diagnostic::error(self.to_string())
                .with_note(format!("`{}` declared in {}", name, first.display()))
                .with_note(format!("`{}` declared again in {}", name, second.display()))
                .with_help(suggestions::DUPLICATE_MODULE),
            GraphError::Unreadable { path, source } => Diagnostic::error(self.to_string())
                .with_location(path)
                .with_note(source.to_string())
                .with_help(suggestions::UNREADABLE),
        }
    }
}
