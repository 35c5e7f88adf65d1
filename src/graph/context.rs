//! Per-run registries filled while scanning.
//!
//! A [`ScanContext`] owns everything learned about the source tree: the kind
//! of every file, the raw dependencies each file declared, which module names
//! map to which files, and which partitions belong to each primary module.
//! It is created once per run and handed explicitly to later stages.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use crate::core::{Kind, ModuleName, RawDep, SourceInfo};
use crate::graph::GraphError;
use crate::scan::{classify, FileScan};
use crate::util::PatternSet;

/// Everything known about the scanned files.
#[derive(Debug, Clone, Default)]
pub struct ScanContext {
    /// Directory relative file identities are read from
    root: PathBuf,
    /// Files matching these default to [`Kind::Header`]
    headers: PatternSet,
    infos: BTreeMap<PathBuf, SourceInfo>,
    raw_deps: BTreeMap<PathBuf, Vec<RawDep>>,
    header_units: BTreeSet<PathBuf>,
    names: BTreeMap<ModuleName, PathBuf>,
    partitions: BTreeMap<String, Vec<ModuleName>>,
}

impl ScanContext {
    /// Create an empty context reading files relative to `root`.
    pub fn new(root: impl Into<PathBuf>, headers: PatternSet) -> Self {
        ScanContext {
            root: root.into(),
            headers,
            ..ScanContext::default()
        }
    }

    /// Read and classify every file in `files`.
    ///
    /// Files imported as header-units are pulled in and classified too, even
    /// when discovery did not list them.
    pub fn scan_files<I>(&mut self, files: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut queue: VecDeque<PathBuf> = files.into_iter().collect();

        while let Some(path) = queue.pop_front() {
            if self.infos.contains_key(&path) {
                continue;
            }

            let full = self.root.join(&path);
            let content = std::fs::read_to_string(&full).map_err(|source| {
                GraphError::Unreadable {
                    path: path.clone(),
                    source,
                }
            })?;

            let scan = classify(&path, &content, self.default_kind(&path));
            for unit in &scan.header_units {
                if !self.infos.contains_key(unit) {
                    tracing::debug!(
                        "pulling in header-unit {} imported by {}",
                        unit.display(),
                        path.display()
                    );
                    queue.push_back(unit.clone());
                }
            }
            self.add_scan(path, scan)?;
        }

        Ok(())
    }

    /// Default kind for `path` before any directive is seen.
    pub fn default_kind(&self, path: &Path) -> Kind {
        if self.headers.matches(path) {
            Kind::Header
        } else {
            Kind::GlobalUnit
        }
    }

    /// Record the classification of one file.
    ///
    /// A file imported as a header-unit by anyone is a header-unit, no matter
    /// which of the two files was recorded first.
    pub fn add_scan(&mut self, path: PathBuf, scan: FileScan) -> Result<(), GraphError> {
        let FileScan {
            info,
            deps,
            header_units,
        } = scan;

        for unit in header_units {
            if let Some(existing) = self.infos.get_mut(&unit) {
                existing.kind = Kind::HeaderUnit;
            }
            self.header_units.insert(unit);
        }

        if let Some(name) = info.module_name.clone() {
            if info.kind.exports_name() {
                if info.kind.is_partition() {
                    self.partitions
                        .entry(name.primary().to_string())
                        .or_default()
                        .push(name.clone());
                }
                self.register_name(name, &path)?;
            }
        }

        let mut info = info;
        if self.header_units.contains(&path) {
            info.kind = Kind::HeaderUnit;
        }

        tracing::debug!(
            "classified {} as {} {}",
            path.display(),
            info.kind,
            info.module_str()
        );

        self.infos.insert(path.clone(), info);
        self.raw_deps.insert(path, deps);
        Ok(())
    }

    fn register_name(&mut self, name: ModuleName, path: &Path) -> Result<(), GraphError> {
        match self.names.get(&name) {
            Some(first) if first != path => Err(GraphError::DuplicateModule {
                name,
                first: first.clone(),
                second: path.to_path_buf(),
            }),
            _ => {
                self.names.insert(name, path.to_path_buf());
                Ok(())
            }
        }
    }

    /// Whether `path` was scanned.
    pub fn contains(&self, path: &Path) -> bool {
        self.infos.contains_key(path)
    }

    /// Classification of `path`.
    pub fn info(&self, path: &Path) -> Option<&SourceInfo> {
        self.infos.get(path)
    }

    /// All classified files, sorted by path.
    pub fn infos(&self) -> &BTreeMap<PathBuf, SourceInfo> {
        &self.infos
    }

    /// Raw dependencies of every file, sorted by path.
    pub fn raw_deps(&self) -> &BTreeMap<PathBuf, Vec<RawDep>> {
        &self.raw_deps
    }

    /// File defining `name`, if any scanned file exports it.
    pub fn defining_file(&self, name: &ModuleName) -> Option<&PathBuf> {
        self.names.get(name)
    }

    /// Partitions registered for the primary module `primary`.
    pub fn partitions_of(&self, primary: &str) -> &[ModuleName] {
        self.partitions
            .get(primary)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of classified files.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Whether no file was classified.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}
