//! Module name resolution.
//!
//! Rewrites every raw dependency into the file namespace where a scanned file
//! defines it. Anything else becomes an external leaf; an unresolved module
//! name is not an error, the compiler may well know where to find it.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::core::{Dep, ExternalDep, Kind, ModuleName, RawDep};
use crate::graph::ScanContext;

/// Resolve a single raw dependency.
pub fn resolve_dep(ctx: &ScanContext, dep: &RawDep) -> Dep {
    match dep {
        RawDep::File(path) if ctx.contains(path) => Dep::File(path.clone()),
        RawDep::File(path) => Dep::External(ExternalDep::MissingFile(path.clone())),
        RawDep::Module(name) => resolve_name(ctx, name),
        RawDep::SystemHeader(h) => Dep::External(ExternalDep::SystemHeader(h.clone())),
        RawDep::SystemHeaderUnit(h) => Dep::External(ExternalDep::SystemHeaderUnit(h.clone())),
    }
}

/// Resolve a module name to its defining file, if one was scanned.
pub fn resolve_name(ctx: &ScanContext, name: &ModuleName) -> Dep {
    match ctx.defining_file(name) {
        Some(path) => Dep::File(path.clone()),
        None => Dep::External(ExternalDep::Module(name.clone())),
    }
}

/// Resolve the dependencies of every scanned file.
///
/// A module implementation unit (`module foo;`) implicitly imports its
/// primary interface, so that edge is added here when the interface is known.
pub fn resolve_all(ctx: &ScanContext) -> BTreeMap<PathBuf, Vec<Dep>> {
    let mut resolved = BTreeMap::new();

    for (path, raw) in ctx.raw_deps() {
        let mut deps: Vec<Dep> = raw.iter().map(|dep| resolve_dep(ctx, dep)).collect();

        if let Some(info) = ctx.info(path) {
            if let (Kind::ModuleUnit, Some(name)) = (info.kind, &info.module_name) {
                if let Dep::File(interface) = resolve_name(ctx, name) {
                    deps.insert(0, Dep::File(interface));
                }
            }
        }

        let unresolved = deps
            .iter()
            .filter(|d| matches!(d, Dep::External(ExternalDep::Module(_))))
            .count();
        if unresolved > 0 {
            tracing::debug!(
                "{}: {} module import(s) left to the compiler",
                path.display(),
                unresolved
            );
        }

        resolved.insert(path.clone(), deps);
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::classify;
    use crate::util::PatternSet;
    use std::path::Path;

    fn context(files: &[(&str, &str)]) -> ScanContext {
        let mut ctx = ScanContext::new(".", PatternSet::new(["*.h"]).unwrap());
        for (path, content) in files {
            let path = PathBuf::from(path);
            let scan = classify(&path, content, ctx.default_kind(&path));
            ctx.add_scan(path, scan).unwrap();
        }
        ctx
    }

    #[test]
    fn test_import_resolves_to_interface_file() {
        let ctx = context(&[
            ("src/foo.cppm", "export module foo;"),
            ("src/main.cpp", "import foo;"),
        ]);
        let deps = resolve_all(&ctx);
        assert_eq!(
            deps[Path::new("src/main.cpp")],
            vec![Dep::File(PathBuf::from("src/foo.cppm"))]
        );
    }

    #[test]
    fn test_relative_partition_import_resolves() {
        let ctx = context(&[
            ("src/part.cpp", "module foo:part;"),
            ("src/foo.cppm", "export module foo;\nimport :part;"),
        ]);
        let deps = resolve_all(&ctx);
        assert_eq!(
            deps[Path::new("src/foo.cppm")],
            vec![Dep::File(PathBuf::from("src/part.cpp"))]
        );
    }

    #[test]
    fn test_unknown_module_stays_external() {
        let ctx = context(&[("src/main.cpp", "import std;")]);
        let deps = resolve_all(&ctx);
        assert_eq!(
            deps[Path::new("src/main.cpp")],
            vec![Dep::External(ExternalDep::Module("std".into()))]
        );
    }

    #[test]
    fn test_include_resolution() {
        let ctx = context(&[
            ("src/a.cpp", "#include \"local.h\"\n#include <vector>\n#include \"gen.h\""),
            ("src/local.h", ""),
        ]);
        let deps = resolve_all(&ctx);
        assert_eq!(
            deps[Path::new("src/a.cpp")],
            vec![
                Dep::File(PathBuf::from("src/local.h")),
                Dep::External(ExternalDep::SystemHeader("vector".into())),
                Dep::External(ExternalDep::MissingFile(PathBuf::from("src/gen.h"))),
            ]
        );
    }

    #[test]
    fn test_module_unit_depends_on_its_interface() {
        let ctx = context(&[
            ("src/foo.cppm", "export module foo;"),
            ("src/foo.cpp", "module foo;\nimport bar;"),
        ]);
        let deps = resolve_all(&ctx);
        assert_eq!(
            deps[Path::new("src/foo.cpp")],
            vec![
                Dep::File(PathBuf::from("src/foo.cppm")),
                Dep::External(ExternalDep::Module("bar".into())),
            ]
        );
    }
}
