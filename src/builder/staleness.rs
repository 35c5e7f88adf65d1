//! Timestamp-based up-to-date checks for incremental builds.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::util::fs::modified_time;

/// Decides whether an artifact can be reused.
///
/// An artifact is fresh iff it exists, no dependency is being rebuilt in this
/// run, and every dependency was last modified strictly before it. Paths
/// passed to [`mark_rebuilding`](Self::mark_rebuilding) poison every
/// artifact that depends on them regardless of timestamps.
#[derive(Debug, Clone, Default)]
pub struct StalenessOracle {
    incremental: bool,
    root: PathBuf,
    rebuilding: BTreeSet<PathBuf>,
}

impl StalenessOracle {
    /// Create an oracle. Relative paths are stat'ed under `root`.
    pub fn new(incremental: bool, root: impl Into<PathBuf>) -> Self {
        StalenessOracle {
            incremental,
            root: root.into(),
            rebuilding: BTreeSet::new(),
        }
    }

    /// Whether timestamps are consulted at all.
    pub fn is_incremental(&self) -> bool {
        self.incremental
    }

    /// Record that `path` is rebuilt in this run.
    pub fn mark_rebuilding(&mut self, path: impl Into<PathBuf>) {
        self.rebuilding.insert(path.into());
    }

    /// Whether `path` is rebuilt in this run.
    pub fn is_rebuilding(&self, path: &Path) -> bool {
        self.rebuilding.contains(path)
    }

    /// Whether `artifact` is up to date with respect to `deps`.
    ///
    /// A dependency that cannot be stat'ed counts as changed. Non-incremental
    /// oracles always answer `false`.
    pub fn is_up_to_date<'a, I>(&self, artifact: &Path, deps: I) -> bool
    where
        I: IntoIterator<Item = &'a Path>,
    {
        if !self.incremental {
            return false;
        }

        let Some(built) = modified_time(&self.root.join(artifact)) else {
            return false;
        };

        for dep in deps {
            if self.rebuilding.contains(dep) {
                tracing::debug!(
                    "{} is stale: {} is being rebuilt",
                    artifact.display(),
                    dep.display()
                );
                return false;
            }
            match modified_time(&self.root.join(dep)) {
                Some(changed) if changed < built => {}
                _ => {
                    tracing::debug!(
                        "{} is stale: {} changed",
                        artifact.display(),
                        dep.display()
                    );
                    return false;
                }
            }
        }

        true
    }
}
