//! Read-only text projections of the graph, schedule and plan.

use std::fmt::{self, Write as _};
use std::path::Path;
use std::str::FromStr;

use anyhow::Result;

use crate::builder::BuildPlan;
use crate::core::Dep;
use crate::graph::{DependencyGraph, Schedule};

/// A report that can be requested with `--show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShowKind {
    /// File classification table
    List,
    /// Resolved dependency table
    Deps,
    /// Scheduler steps
    Order,
    /// Shell text of the plan
    Cmd,
    /// The plan as JSON
    Plan,
}

impl ShowKind {
    /// All report kinds, in display order.
    pub const ALL: [ShowKind; 5] = [
        ShowKind::List,
        ShowKind::Deps,
        ShowKind::Order,
        ShowKind::Cmd,
        ShowKind::Plan,
    ];

    /// Get the kind as its command line spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShowKind::List => "list",
            ShowKind::Deps => "deps",
            ShowKind::Order => "order",
            ShowKind::Cmd => "cmd",
            ShowKind::Plan => "plan",
        }
    }
}

impl FromStr for ShowKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShowKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown report `{}` (expected one of: list, deps, order, cmd, plan)",
                    s
                )
            })
    }
}

fn quoted(path: &Path) -> String {
    format!("\"{}\"", path.display())
}

fn dep_text(dep: &Dep) -> String {
    match dep {
        Dep::File(path) => quoted(path),
        Dep::External(external) => external.to_string(),
    }
}

/// `"path", kind, module` per file.
pub fn render_list(graph: &DependencyGraph) -> Result<String, fmt::Error> {
    let mut out = String::new();
    for (path, info) in graph.infos() {
        writeln!(out, "{}, {}, {}", quoted(path), info.kind, info.module_str())?;
    }
    Ok(out)
}

/// `"path", dep, dep...` per file.
pub fn render_deps(graph: &DependencyGraph) -> Result<String, fmt::Error> {
    let mut out = String::new();
    for (path, deps) in graph.iter() {
        let deps: Vec<String> = deps.iter().map(dep_text).collect();
        if deps.is_empty() {
            writeln!(out, "{},", quoted(path))?;
        } else {
            writeln!(out, "{}, {}", quoted(path), deps.join(", "))?;
        }
    }
    Ok(out)
}

/// One line of quoted paths per step.
pub fn render_order(schedule: &Schedule) -> Result<String, fmt::Error> {
    let mut out = String::new();
    for step in schedule.steps() {
        let paths: Vec<String> = step.iter().map(|p| quoted(p)).collect();
        writeln!(out, "{}", paths.join(", "))?;
    }
    Ok(out)
}

/// Render one report.
pub fn render(
    kind: ShowKind,
    graph: &DependencyGraph,
    schedule: &Schedule,
    plan: &BuildPlan,
) -> Result<String> {
    Ok(match kind {
        ShowKind::List => render_list(graph)?,
        ShowKind::Deps => render_deps(graph)?,
        ShowKind::Order => render_order(schedule)?,
        ShowKind::Cmd => plan.shell_text(),
        ShowKind::Plan => {
            let mut json = serde_json::to_string_pretty(plan)?;
            json.push('\n');
            json
        }
    })
}

/// Render every requested report, each followed by a blank line.
pub fn render_all(
    kinds: &[ShowKind],
    graph: &DependencyGraph,
    schedule: &Schedule,
    plan: &BuildPlan,
) -> Result<String> {
    let mut out = String::new();
    for &kind in kinds {
        out.push_str(&render(kind, graph, schedule, plan)?);
        out.push('\n');
    }
    Ok(out)
}
