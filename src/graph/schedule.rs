//! Topological scheduling into parallelizable steps.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use serde::Serialize;

use crate::graph::{DependencyGraph, GraphError};

/// Nodes grouped into steps. Every node's file dependencies live in strictly
/// earlier steps; nodes within a step are independent and sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schedule {
    steps: Vec<Vec<PathBuf>>,
}

impl Schedule {
    /// The steps, in build order.
    pub fn steps(&self) -> &[Vec<PathBuf>] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether there are no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step index of every node.
    pub fn step_index(&self) -> BTreeMap<&Path, usize> {
        self.steps
            .iter()
            .enumerate()
            .flat_map(|(i, step)| step.iter().map(move |p| (p.as_path(), i)))
            .collect()
    }

    /// All nodes in build order.
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.steps.iter().flatten()
    }
}

/// Order `graph` into steps.
///
/// External dependencies impose no ordering. A cycle among files is fatal and
/// no partial schedule is returned.
pub fn schedule(graph: &DependencyGraph) -> Result<Schedule, GraphError> {
    let (pg, _) = graph.to_petgraph();

    // Outgoing edges point at dependencies.
    let mut pending: Vec<usize> = pg
        .node_indices()
        .map(|n| pg.neighbors_directed(n, Direction::Outgoing).count())
        .collect();

    let mut ready: Vec<NodeIndex> = pg
        .node_indices()
        .filter(|n| pending[n.index()] == 0)
        .collect();

    let mut steps = Vec::new();
    let mut done = 0;

    while !ready.is_empty() {
        let mut next = Vec::new();
        for &node in &ready {
            for dependent in pg.neighbors_directed(node, Direction::Incoming) {
                pending[dependent.index()] -= 1;
                if pending[dependent.index()] == 0 {
                    next.push(dependent);
                }
            }
        }

        done += ready.len();
        let mut step: Vec<PathBuf> = ready.iter().map(|&n| pg[n].to_path_buf()).collect();
        step.sort();
        steps.push(step);
        ready = next;
    }

    if done < pg.node_count() {
        let files = tarjan_scc(&pg)
            .into_iter()
            .find(|scc| scc.len() > 1 || pg.contains_edge(scc[0], scc[0]))
            .map(|scc| cycle_path(&pg, &scc))
            .unwrap_or_default();
        return Err(GraphError::Cycle { files });
    }

    tracing::debug!("scheduled {} node(s) in {} step(s)", done, steps.len());
    Ok(Schedule { steps })
}

/// Walk one concrete cycle inside a strongly connected component.
fn cycle_path(pg: &petgraph::graph::DiGraph<&Path, ()>, scc: &[NodeIndex]) -> Vec<PathBuf> {
    let Some(&start) = scc.iter().min_by_key(|n| pg[**n]) else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut current = start;
    loop {
        let Some(next) = pg
            .neighbors_directed(current, Direction::Outgoing)
            .filter(|n| scc.contains(n))
            .min_by_key(|n| pg[*n])
        else {
            break;
        };

        if let Some(pos) = path.iter().position(|&n| n == next) {
            path.drain(..pos);
            path.push(next);
            break;
        }
        path.push(next);
        current = next;
    }

    path.into_iter().map(|n| pg[n].to_path_buf()).collect()
}
