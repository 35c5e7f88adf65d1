//! Implementation of `gantry clean`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::toolchain::{DEFAULT_AR, DEFAULT_CXX};
use crate::builder::{GccToolchain, Toolchain};
use crate::util::fs::remove_dir_all_if_exists;

/// Remove the object directory and the compiler's module cache under `root`.
///
/// Returns the directories that existed and were removed.
pub fn clean(root: &Path, obj_dir: &Path) -> Result<Vec<PathBuf>> {
    let toolchain = GccToolchain::new(DEFAULT_CXX, DEFAULT_AR);
    let mut targets = vec![obj_dir.to_path_buf()];
    targets.extend(toolchain.module_cache_dir().map(Path::to_path_buf));

    let mut removed = Vec::new();
    for target in targets {
        let full = root.join(&target);
        if full.exists() {
            remove_dir_all_if_exists(&full)?;
            tracing::debug!("removed {}", full.display());
            removed.push(target);
        }
    }
    Ok(removed)
}
