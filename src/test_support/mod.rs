//! Test utilities and mocks for Gantry unit tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::test_support::{MockRunner, ProjectFixture};
//!
//! #[test]
//! fn test_example() {
//!     let tmp = tempfile::TempDir::new().unwrap();
//!     ProjectFixture::hello_module().write_to(tmp.path()).unwrap();
//!
//!     let runner = MockRunner::new(tmp.path());
//!     // Execute a plan with `runner`, then inspect `runner.commands()`.
//! }
//! ```

pub mod fixtures;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use anyhow::Result;

use crate::builder::executor::{CommandRunner, ExecError};
use crate::builder::toolchain::CommandSpec;

pub use fixtures::*;

/// Command runner that records commands instead of spawning them.
///
/// Every successful command touches its output file under `root`, so
/// timestamp checks behave as after a real build.
#[derive(Debug, Clone)]
pub struct MockRunner {
    root: PathBuf,
    fail_on: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockRunner {
    /// Create a runner writing outputs under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        MockRunner {
            root: root.into(),
            fail_on: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail every command whose text contains `needle`.
    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on = Some(needle.into());
        self
    }

    /// Commands run so far, in completion order.
    pub fn commands(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Forget recorded commands.
    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, command: &CommandSpec, output: &Path) -> Result<()> {
        let text = command.to_string();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(text.clone());
        }

        if let Some(needle) = &self.fail_on {
            if text.contains(needle.as_str()) {
                return Err(ExecError::CommandFailed {
                    command: text,
                    status: "exit status: 1".to_string(),
                    stderr: format!("mock failure on {}", needle),
                }
                .into());
            }
        }

        let full = self.root.join(output);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full, text)?;
        Ok(())
    }
}

/// Set the modification time of an existing file.
pub fn set_mtime(path: &Path, time: SystemTime) {
    let file = std::fs::File::options()
        .write(true)
        .open(path)
        .unwrap_or_else(|e| panic!("cannot open {}: {}", path.display(), e));
    file.set_modified(time)
        .unwrap_or_else(|e| panic!("cannot set mtime of {}: {}", path.display(), e));
}
