//! Source file discovery.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

use crate::util::fs::{normalize_lexically, relative_path};
use crate::util::PatternSet;

/// Which files to pick up while walking the source roots.
#[derive(Debug, Clone, Default)]
pub struct SourceFilter {
    /// A file must match one of these
    pub include: PatternSet,
    /// ...and none of these
    pub exclude: PatternSet,
}

impl SourceFilter {
    /// Create a filter from include and exclude sets.
    pub fn new(include: PatternSet, exclude: PatternSet) -> Self {
        SourceFilter { include, exclude }
    }

    /// Whether `path` should be inspected.
    pub fn accepts(&self, path: &Path) -> bool {
        self.include.matches(path) && !self.exclude.matches(path)
    }
}

/// Collect candidate source files under `roots`.
///
/// Directories are walked recursively, plain files are taken as-is; both go
/// through `filter`. Returned paths are relative to `cwd` unless `absolute`
/// is set, and lexically normalized so they can serve as file identities.
pub fn discover(
    cwd: &Path,
    roots: &[PathBuf],
    filter: &SourceFilter,
    absolute: bool,
) -> Result<BTreeSet<PathBuf>> {
    let mut found = BTreeSet::new();

    for root in roots {
        let full = normalize_lexically(&cwd.join(root));
        if !full.exists() {
            bail!("source path does not exist: {}", root.display());
        }

        let identity = |path: &Path| {
            if absolute {
                path.to_path_buf()
            } else {
                normalize_lexically(&relative_path(cwd, path))
            }
        };

        if full.is_dir() {
            for entry in WalkDir::new(&full).sort_by_file_name() {
                let entry = entry
                    .with_context(|| format!("failed to walk directory: {}", root.display()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = identity(entry.path());
                if filter.accepts(&path) {
                    found.insert(path);
                }
            }
        } else {
            let path = identity(&full);
            if filter.accepts(&path) {
                found.insert(path);
            }
        }
    }

    tracing::debug!("discovered {} source file(s)", found.len());
    Ok(found)
}
