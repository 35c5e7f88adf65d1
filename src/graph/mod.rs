//! Dependency graph over scanned files.
//!
//! Pipeline: [`ScanContext`] collects classifications, [`resolve`] maps module
//! names onto files, [`DependencyGraph::build`] assembles the adjacency map and
//! [`schedule`] orders it into steps.

pub mod context;
pub mod errors;
pub mod resolve;
pub mod schedule;

pub use context::ScanContext;
pub use errors::GraphError;
pub use schedule::{schedule, Schedule};

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use crate::core::{Dep, ExternalDep, Kind, SourceInfo};
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Every scanned file with its resolved dependencies.
///
/// Every file is a key, even with no dependencies, and every [`Dep::File`]
/// target is itself a key.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DependencyGraph {
    infos: BTreeMap<PathBuf, SourceInfo>,
    deps: BTreeMap<PathBuf, Vec<Dep>>,
}

impl DependencyGraph {
    /// Build the graph from a fully scanned context.
    pub fn build(ctx: &ScanContext) -> Self {
        DependencyGraph::from_parts(ctx.infos().clone(), resolve::resolve_all(ctx))
    }

    /// Assemble a graph from classifications and resolved dependencies.
    ///
    /// Files present in only one of the maps are completed with defaults
    /// (no dependencies, [`Kind::GlobalUnit`]). File targets that are not
    /// nodes are demoted to [`ExternalDep::MissingFile`].
    pub fn from_parts(
        mut infos: BTreeMap<PathBuf, SourceInfo>,
        mut deps: BTreeMap<PathBuf, Vec<Dep>>,
    ) -> Self {
        for path in deps.keys() {
            infos
                .entry(path.clone())
                .or_insert_with(|| SourceInfo::new(Kind::GlobalUnit));
        }
        for path in infos.keys() {
            deps.entry(path.clone()).or_default();
        }

        for list in deps.values_mut() {
            for dep in list.iter_mut() {
                if let Dep::File(target) = dep {
                    if !infos.contains_key(target) {
                        *dep = Dep::External(ExternalDep::MissingFile(target.clone()));
                    }
                }
            }
        }

        DependencyGraph { infos, deps }
    }

    /// Build a graph from a bare dependency map.
    pub fn from_deps(deps: BTreeMap<PathBuf, Vec<Dep>>) -> Self {
        DependencyGraph::from_parts(BTreeMap::new(), deps)
    }

    /// All nodes, sorted.
    pub fn nodes(&self) -> impl Iterator<Item = &PathBuf> {
        self.deps.keys()
    }

    /// Nodes with their dependencies, sorted by path.
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &Vec<Dep>)> {
        self.deps.iter()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.deps.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    /// Classification of a node.
    pub fn info(&self, path: &Path) -> Option<&SourceInfo> {
        self.infos.get(path)
    }

    /// All classifications, sorted by path.
    pub fn infos(&self) -> &BTreeMap<PathBuf, SourceInfo> {
        &self.infos
    }

    /// Kind of a node.
    pub fn kind(&self, path: &Path) -> Option<Kind> {
        self.infos.get(path).map(|i| i.kind)
    }

    /// Direct dependencies of a node, including externals.
    pub fn deps(&self, path: &Path) -> &[Dep] {
        self.deps.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct file dependencies of a node, deduplicated.
    pub fn file_deps(&self, path: &Path) -> BTreeSet<&PathBuf> {
        self.deps(path).iter().filter_map(Dep::as_file).collect()
    }

    /// All files `path` depends on, directly or not. Excludes `path` itself
    /// unless it sits on a cycle.
    pub fn transitive_file_deps(&self, path: &Path) -> BTreeSet<PathBuf> {
        let mut visited = BTreeSet::new();
        let mut stack: Vec<&PathBuf> = self.file_deps(path).into_iter().collect();

        while let Some(current) = stack.pop() {
            if visited.insert(current.clone()) {
                stack.extend(self.file_deps(current));
            }
        }

        visited
    }

    /// Quoted includes of `path` and of everything it depends on whose target
    /// was never scanned.
    pub fn undiscovered_includes(&self, path: &Path) -> BTreeSet<PathBuf> {
        std::iter::once(path.to_path_buf())
            .chain(self.transitive_file_deps(path))
            .flat_map(|node| {
                self.deps(&node)
                    .iter()
                    .filter_map(|dep| match dep {
                        Dep::External(ExternalDep::MissingFile(target)) => Some(target.clone()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Non-fatal problems found in the graph.
    ///
    /// A partition import (`import :p;`) seen before any module declaration
    /// has nothing to anchor on and can never resolve.
    pub fn warnings(&self) -> Vec<Diagnostic> {
        let mut warnings = Vec::new();
        for (path, deps) in &self.deps {
            for dep in deps {
                if let Dep::External(ExternalDep::Module(name)) = dep {
                    if name.is_relative() {
                        warnings.push(
                            Diagnostic::warning(format!(
                                "partition import `{}` has no owning module",
                                name
                            ))
                            .with_location(path)
                            .with_help(suggestions::DECLARE_MODULE_FIRST),
                        );
                    }
                }
            }
        }
        warnings
    }

    /// Petgraph view of the file edges. An edge `a -> b` means `a` depends on `b`.
    pub(crate) fn to_petgraph(&self) -> (DiGraph<&Path, ()>, BTreeMap<&Path, NodeIndex>) {
        let mut graph = DiGraph::with_capacity(self.deps.len(), self.deps.len());
        let mut index = BTreeMap::new();

        for path in self.deps.keys() {
            index.insert(path.as_path(), graph.add_node(path.as_path()));
        }

        for (path, deps) in &self.deps {
            let from = index[path.as_path()];
            for dep in deps.iter().filter_map(Dep::as_file) {
                if let Some(&to) = index.get(dep.as_path()) {
                    graph.update_edge(from, to, ());
                }
            }
        }

        (graph, index)
    }
}
