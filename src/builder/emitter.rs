//! Turns a schedule into a [`BuildPlan`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::builder::plan::{
    Action, ActionGroup, BuildPlan, CompileStep, LinkStep, OutputKind, Phase,
};
use crate::builder::staleness::StalenessOracle;
use crate::builder::toolchain::{CompileInput, LinkInput, Toolchain};
use crate::core::Kind;
use crate::graph::{DependencyGraph, Schedule};
use crate::util::fs::rebase_under;

/// Where artifacts go and which outputs are requested.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Directory holding object files
    pub obj_dir: PathBuf,
    /// Directory holding linked outputs
    pub out_dir: PathBuf,
    /// Requested outputs, by kind and name
    pub outputs: Vec<(OutputKind, String)>,
    /// Skip work whose artifacts are up to date
    pub incremental: bool,
    /// Leave objects and the module cache in place
    pub keep_intermediates: bool,
    /// Directory relative paths are stat'ed under
    pub root: PathBuf,
}

impl Default for EmitOptions {
    fn default() -> Self {
        EmitOptions {
            obj_dir: PathBuf::from("obj"),
            out_dir: PathBuf::from("."),
            outputs: Vec::new(),
            incremental: false,
            keep_intermediates: false,
            root: PathBuf::from("."),
        }
    }
}

/// Object file path for `source`.
///
/// `source` is placed under `obj_dir` with any root or `..` components made
/// harmless, and `.o` is appended to the full file name.
pub fn object_path(obj_dir: &Path, source: &Path) -> PathBuf {
    let mut object = rebase_under(obj_dir, source).into_os_string();
    object.push(".o");
    PathBuf::from(object)
}

/// Linked output path of `kind` called `name`.
pub fn output_path(out_dir: &Path, kind: OutputKind, name: &str) -> PathBuf {
    let file = kind.file_name(name);
    if out_dir.as_os_str().is_empty() || out_dir == Path::new(".") {
        PathBuf::from(file)
    } else {
        out_dir.join(file)
    }
}

/// Emit the plan for `graph` in `schedule` order.
pub fn emit(
    graph: &DependencyGraph,
    schedule: &Schedule,
    toolchain: &dyn Toolchain,
    opts: &EmitOptions,
) -> BuildPlan {
    let mut oracle = StalenessOracle::new(opts.incremental, &opts.root);
    let mut dirs = BTreeSet::new();
    let mut objects = Vec::new();
    let mut groups = Vec::new();
    let mut fresh = 0;

    for (index, step) in schedule.steps().iter().enumerate() {
        let mut group = ActionGroup::new(Phase::Compile { step: index });

        for source in step {
            let kind = graph.kind(source).unwrap_or(Kind::GlobalUnit);
            if !kind.is_compiled() {
                continue;
            }

            let output = object_path(&opts.obj_dir, source);
            if let Some(parent) = output.parent() {
                dirs.insert(parent.to_path_buf());
            }
            objects.push(output.clone());

            let mut deps = graph.transitive_file_deps(source);
            // Unscanned includes still count once they exist on disk.
            deps.extend(
                graph
                    .undiscovered_includes(source)
                    .into_iter()
                    .filter(|include| opts.root.join(include).is_file()),
            );
            let inputs = std::iter::once(source.as_path()).chain(deps.iter().map(PathBuf::as_path));
            if oracle.is_up_to_date(&output, inputs) {
                tracing::debug!("{} is up to date", output.display());
                fresh += 1;
                continue;
            }

            oracle.mark_rebuilding(source.clone());
            oracle.mark_rebuilding(output.clone());

            let input = CompileInput {
                source: source.clone(),
                output: output.clone(),
            };
            group.actions.push(if kind == Kind::HeaderUnit {
                Action::Precompile(CompileStep {
                    command: toolchain.header_unit_command(&input),
                    source: input.source,
                    output: input.output,
                })
            } else {
                Action::Compile(CompileStep {
                    command: toolchain.compile_command(&input),
                    source: input.source,
                    output: input.output,
                })
            });
        }

        if !group.actions.is_empty() {
            group.actions.sort_by_key(Action::shell_text);
            groups.push(group);
        }
    }

    let mut links = ActionGroup::new(Phase::Link);
    for (kind, name) in &opts.outputs {
        let output = output_path(&opts.out_dir, *kind, name);
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            dirs.insert(parent.to_path_buf());
        }

        if oracle.is_up_to_date(&output, objects.iter().map(PathBuf::as_path)) {
            tracing::debug!("{} is up to date", output.display());
            continue;
        }

        let input = LinkInput {
            objects: objects.clone(),
            output,
        };
        let command = match kind {
            OutputKind::StaticLib => toolchain.archive_command(&input),
            OutputKind::SharedLib => toolchain.link_shared_command(&input),
            OutputKind::Executable => toolchain.link_exe_command(&input),
        };
        links.actions.push(Action::Link(LinkStep {
            kind: *kind,
            objects: input.objects,
            output: input.output,
            command,
        }));
    }

    let mut setup = ActionGroup::new(Phase::Setup);
    setup.actions = dirs
        .into_iter()
        .map(|path| Action::CreateDir { path })
        .collect();

    let mut plan = BuildPlan {
        groups: Vec::with_capacity(groups.len() + 3),
        objects,
        fresh,
    };
    if !setup.actions.is_empty() {
        plan.groups.push(setup);
    }
    plan.groups.extend(groups);
    if !links.actions.is_empty() {
        plan.groups.push(links);
    }

    if !opts.keep_intermediates {
        let mut paths = vec![opts.obj_dir.clone()];
        paths.extend(toolchain.module_cache_dir().map(Path::to_path_buf));
        let mut cleanup = ActionGroup::new(Phase::Cleanup);
        cleanup.actions.push(Action::Remove { paths });
        plan.groups.push(cleanup);
    }

    tracing::debug!(
        "planned {} compile(s), {} link(s), {} up to date",
        plan.compile_count(),
        plan.link_count(),
        plan.fresh
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::toolchain::GccToolchain;
    use crate::core::{Dep, SourceInfo};
    use crate::graph::schedule;
    use crate::test_support::set_mtime;
    use std::collections::BTreeMap;
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn toolchain() -> GccToolchain {
        GccToolchain::new("g++", "ar")
    }

    /// `foo.cppm` exports foo, `main.cpp` imports it and includes `util.h`.
    fn graph() -> DependencyGraph {
        let mut infos = BTreeMap::new();
        infos.insert(PathBuf::from("src/foo.cppm"), SourceInfo::new(Kind::PrimaryModuleInterface));
        infos.insert(PathBuf::from("src/main.cpp"), SourceInfo::new(Kind::GlobalUnit));
        infos.insert(PathBuf::from("src/util.h"), SourceInfo::new(Kind::Header));

        let mut deps = BTreeMap::new();
        deps.insert(
            PathBuf::from("src/main.cpp"),
            vec![
                Dep::File(PathBuf::from("src/foo.cppm")),
                Dep::File(PathBuf::from("src/util.h")),
            ],
        );
        DependencyGraph::from_parts(infos, deps)
    }

    fn opts(root: &Path, incremental: bool) -> EmitOptions {
        EmitOptions {
            outputs: vec![(OutputKind::Executable, "app".to_string())],
            incremental,
            keep_intermediates: incremental,
            root: root.to_path_buf(),
            ..EmitOptions::default()
        }
    }

    fn phases(plan: &BuildPlan) -> Vec<Phase> {
        plan.groups.iter().map(|g| g.phase).collect()
    }

    #[test]
    fn test_object_path() {
        assert_eq!(
            object_path(Path::new("obj"), Path::new("src/a.cpp")),
            PathBuf::from("obj/src/a.cpp.o")
        );
        assert_eq!(
            object_path(Path::new("obj"), Path::new("../lib/b.cppm")),
            PathBuf::from("obj/__/lib/b.cppm.o")
        );
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("."), OutputKind::StaticLib, "foo"),
            PathBuf::from("libfoo.a")
        );
        assert_eq!(
            output_path(Path::new("out"), OutputKind::Executable, "foo"),
            PathBuf::from("out/foo")
        );
    }

    #[test]
    fn test_full_plan_ordering() {
        let g = graph();
        let s = schedule(&g).unwrap();
        let plan = emit(&g, &s, &toolchain(), &opts(Path::new("."), false));

        assert_eq!(
            phases(&plan),
            vec![
                Phase::Setup,
                Phase::Compile { step: 0 },
                Phase::Compile { step: 1 },
                Phase::Link,
                Phase::Cleanup,
            ]
        );
        assert_eq!(
            plan.groups[0].actions,
            vec![Action::CreateDir {
                path: PathBuf::from("obj/src")
            }]
        );
        assert_eq!(plan.compile_count(), 2);
        assert_eq!(
            plan.objects,
            vec![
                PathBuf::from("obj/src/foo.cppm.o"),
                PathBuf::from("obj/src/main.cpp.o"),
            ]
        );
        assert_eq!(
            plan.groups[3].actions[0].shell_text(),
            "g++ obj/src/foo.cppm.o obj/src/main.cpp.o -o app"
        );
        assert_eq!(plan.groups[4].actions[0].shell_text(), "rm -r obj gcm.cache");
    }

    #[test]
    fn test_headers_are_not_compiled() {
        let g = graph();
        let s = schedule(&g).unwrap();
        let plan = emit(&g, &s, &toolchain(), &opts(Path::new("."), false));
        assert!(plan
            .actions()
            .all(|a| !a.shell_text().contains("src/util.h")));
    }

    #[test]
    fn test_header_units_are_precompiled_and_linked() {
        let mut infos = BTreeMap::new();
        infos.insert(PathBuf::from("inc/u.hpp"), SourceInfo::new(Kind::HeaderUnit));
        infos.insert(PathBuf::from("main.cpp"), SourceInfo::new(Kind::GlobalUnit));
        let mut deps = BTreeMap::new();
        deps.insert(PathBuf::from("main.cpp"), vec![Dep::File(PathBuf::from("inc/u.hpp"))]);
        let g = DependencyGraph::from_parts(infos, deps);
        let s = schedule(&g).unwrap();

        let plan = emit(&g, &s, &toolchain(), &opts(Path::new("."), false));
        assert!(matches!(plan.groups[1].actions[0], Action::Precompile(_)));
        assert!(plan.objects.contains(&PathBuf::from("obj/inc/u.hpp.o")));
    }

    #[test]
    fn test_keep_intermediates_drops_cleanup() {
        let g = graph();
        let s = schedule(&g).unwrap();
        let mut o = opts(Path::new("."), false);
        o.keep_intermediates = true;
        let plan = emit(&g, &s, &toolchain(), &o);
        assert!(plan.cleanup().is_none());
    }

    #[test]
    fn test_no_outputs_means_no_link_group() {
        let g = graph();
        let s = schedule(&g).unwrap();
        let mut o = opts(Path::new("."), false);
        o.outputs.clear();
        let plan = emit(&g, &s, &toolchain(), &o);
        assert_eq!(plan.link_count(), 0);
        assert!(!phases(&plan).contains(&Phase::Link));
    }

    #[test]
    fn test_outputs_in_request_order() {
        let g = graph();
        let s = schedule(&g).unwrap();
        let mut o = opts(Path::new("."), false);
        o.outputs = vec![
            (OutputKind::StaticLib, "foo".to_string()),
            (OutputKind::SharedLib, "foo".to_string()),
            (OutputKind::Executable, "foo".to_string()),
        ];
        let plan = emit(&g, &s, &toolchain(), &o);
        let outputs: Vec<_> = plan
            .actions()
            .filter_map(|a| match a {
                Action::Link(l) => Some(l.output.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            outputs,
            vec![
                PathBuf::from("libfoo.a"),
                PathBuf::from("libfoo.so"),
                PathBuf::from("foo"),
            ]
        );
    }

    /// Write the sources of [`graph`] and every artifact of a previous build,
    /// artifacts newer than sources.
    fn built_tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let old = SystemTime::now() - Duration::from_secs(600);
        let new = SystemTime::now() - Duration::from_secs(60);
        for (path, time) in [
            ("src/foo.cppm", old),
            ("src/main.cpp", old),
            ("src/util.h", old),
            ("obj/src/foo.cppm.o", new),
            ("obj/src/main.cpp.o", new),
            ("app", new + Duration::from_secs(1)),
        ] {
            let full = tmp.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(&full, path).unwrap();
            set_mtime(&full, time);
        }
        tmp
    }

    #[test]
    fn test_incremental_unchanged_tree_emits_nothing() {
        let tmp = built_tree();
        let g = graph();
        let s = schedule(&g).unwrap();
        let plan = emit(&g, &s, &toolchain(), &opts(tmp.path(), true));

        assert_eq!(plan.compile_count(), 0);
        assert_eq!(plan.link_count(), 0);
        assert_eq!(plan.fresh, 2);
        assert_eq!(plan.objects.len(), 2);
        assert!(plan.cleanup().is_none());
    }

    #[test]
    fn test_incremental_missing_output_is_relinked() {
        let tmp = built_tree();
        fs::remove_file(tmp.path().join("app")).unwrap();
        let g = graph();
        let s = schedule(&g).unwrap();
        let plan = emit(&g, &s, &toolchain(), &opts(tmp.path(), true));

        assert_eq!(plan.compile_count(), 0);
        assert_eq!(plan.link_count(), 1);
    }

    #[test]
    fn test_incremental_touched_interface_rebuilds_importers() {
        let tmp = built_tree();
        set_mtime(&tmp.path().join("src/foo.cppm"), SystemTime::now());
        let g = graph();
        let s = schedule(&g).unwrap();
        let plan = emit(&g, &s, &toolchain(), &opts(tmp.path(), true));

        let rebuilt: Vec<_> = plan
            .actions()
            .filter_map(|a| match a {
                Action::Compile(c) => Some(c.source.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            rebuilt,
            vec![PathBuf::from("src/foo.cppm"), PathBuf::from("src/main.cpp")]
        );
        assert_eq!(plan.link_count(), 1);
    }

    /// `a.cpp` includes an `.inl` and a header outside the scanned root,
    /// neither of which is a node, plus a generated header that is absent.
    fn unscanned_includes_tree() -> (TempDir, DependencyGraph) {
        let tmp = TempDir::new().unwrap();
        let old = SystemTime::now() - Duration::from_secs(600);
        let new = SystemTime::now() - Duration::from_secs(60);
        for (path, time) in [
            ("src/a.cpp", old),
            ("src/impl.inl", old),
            ("include/x.h", old),
            ("obj/src/a.cpp.o", new),
            ("app", new + Duration::from_secs(1)),
        ] {
            let full = tmp.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(&full, path).unwrap();
            set_mtime(&full, time);
        }

        let mut deps = BTreeMap::new();
        deps.insert(
            PathBuf::from("src/a.cpp"),
            ["src/impl.inl", "include/x.h", "src/gen.h"]
                .iter()
                .map(|p| Dep::File(PathBuf::from(p)))
                .collect(),
        );
        (tmp, DependencyGraph::from_deps(deps))
    }

    #[test]
    fn test_incremental_absent_unscanned_include_keeps_object_fresh() {
        let (tmp, g) = unscanned_includes_tree();
        let s = schedule(&g).unwrap();
        let plan = emit(&g, &s, &toolchain(), &opts(tmp.path(), true));
        assert_eq!(plan.compile_count(), 0);
        assert_eq!(plan.fresh, 1);
    }

    #[test]
    fn test_incremental_touched_unscanned_includes_rebuild() {
        for touched in ["src/impl.inl", "include/x.h"] {
            let (tmp, g) = unscanned_includes_tree();
            set_mtime(&tmp.path().join(touched), SystemTime::now());
            let s = schedule(&g).unwrap();
            let plan = emit(&g, &s, &toolchain(), &opts(tmp.path(), true));
            assert_eq!(plan.compile_count(), 1, "touching {} must rebuild a.cpp", touched);
            assert_eq!(plan.link_count(), 1);
        }
    }

    #[test]
    fn test_incremental_touched_header_rebuilds_includer_only() {
        let tmp = built_tree();
        set_mtime(&tmp.path().join("src/util.h"), SystemTime::now());
        let g = graph();
        let s = schedule(&g).unwrap();
        let plan = emit(&g, &s, &toolchain(), &opts(tmp.path(), true));

        assert_eq!(plan.compile_count(), 1);
        assert_eq!(plan.fresh, 1);
        assert_eq!(plan.link_count(), 1);
    }
}
