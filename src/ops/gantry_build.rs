//! Implementation of `gantry build`.
//!
//! discover → scan → graph → schedule → plan → (report) → execute

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::builder::{
    emit, BuildExecutor, BuildPlan, CommandRunner, EmitOptions, ExecSummary, GccToolchain,
    OutputKind, ProcessRunner, Toolchain,
};
use crate::graph::{schedule, DependencyGraph, ScanContext, Schedule};
use crate::ops::show::{render_all, ShowKind};
use crate::scan::{discover, SourceFilter};
use crate::util::fs::normalize_lexically;
use crate::util::process::find_executable;
use crate::util::diagnostic::{self, Diagnostic};
use crate::util::{Config, GlobalContext, PatternSet};

/// Output produced when no output was requested.
pub const DEFAULT_EXECUTABLE: &str = "myprog";

/// Options for the build command.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Files or directories to scan
    pub sources: Vec<PathBuf>,

    /// Patterns of files to inspect
    pub source_patterns: Vec<String>,

    /// Patterns of files to skip
    pub exclude_patterns: Vec<String>,

    /// Patterns of files that are headers
    pub header_patterns: Vec<String>,

    /// Identify files by absolute path
    pub absolute_paths: bool,

    /// C++ compiler driver
    pub compiler: Option<PathBuf>,

    /// Archiver for static libraries
    pub archiver: Option<PathBuf>,

    /// Extra flags for every compile and link command
    pub flags: Vec<String>,

    /// Directory for intermediate objects
    pub obj_dir: PathBuf,

    /// Directory for linked outputs
    pub out_dir: PathBuf,

    /// Requested outputs (empty = executable `myprog`)
    pub outputs: Vec<(OutputKind, String)>,

    /// Number of parallel jobs
    pub jobs: Option<usize>,

    /// Skip actions whose artifacts are up to date
    pub incremental: bool,

    /// Keep objects and the module cache after a successful build
    pub keep_intermediates: bool,

    /// Reports to print before building
    pub show: Vec<ShowKind>,

    /// Stop after planning
    pub dry_run: bool,

    /// Emit compile_commands.json
    pub emit_compile_commands: bool,

    /// Verbose output
    pub verbose: bool,

    /// Color diagnostics printed to stderr
    pub color: bool,
}

impl BuildOptions {
    /// Options seeded from configuration.
    pub fn from_config(config: &Config) -> Self {
        BuildOptions {
            sources: vec![PathBuf::from(".")],
            source_patterns: config.patterns.all_sources(),
            exclude_patterns: config.patterns.exclude.clone(),
            header_patterns: config.patterns.all_headers(),
            absolute_paths: config.build.absolute_paths,
            compiler: config.build.compiler.clone(),
            archiver: config.build.archiver.clone(),
            flags: config.build.flags.clone(),
            obj_dir: config
                .build
                .obj_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("obj")),
            out_dir: config
                .build
                .out_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
            outputs: Vec::new(),
            jobs: config.build.jobs,
            incremental: config.build.incremental,
            keep_intermediates: config.keep_intermediates(),
            show: Vec::new(),
            dry_run: false,
            emit_compile_commands: false,
            verbose: false,
            color: false,
        }
    }

    /// Requested outputs, falling back to the default executable.
    pub fn effective_outputs(&self) -> Vec<(OutputKind, String)> {
        if self.outputs.is_empty() {
            vec![(OutputKind::Executable, DEFAULT_EXECUTABLE.to_string())]
        } else {
            let mut outputs = self.outputs.clone();
            outputs.sort_by_key(|(kind, _)| *kind);
            outputs
        }
    }

    /// The toolchain these options describe.
    pub fn toolchain(&self) -> GccToolchain {
        let pic = self
            .effective_outputs()
            .iter()
            .any(|(kind, _)| *kind == OutputKind::SharedLib);
        GccToolchain::detect(self.compiler.clone(), self.archiver.clone())
            .with_flags(self.flags.iter().cloned())
            .with_pic(pic)
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions::from_config(&Config::default())
    }
}

/// The scanned and ordered source tree.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Every scanned file with its resolved dependencies
    pub graph: DependencyGraph,
    /// Build order
    pub schedule: Schedule,
}

/// Result of a build.
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// The emitted plan
    pub plan: BuildPlan,
    /// Rendered `--show` reports
    pub report: String,
    /// What ran, unless this was a dry run
    pub summary: Option<ExecSummary>,
    /// Non-fatal problems, already printed
    pub warnings: Vec<Diagnostic>,
}

/// Discover, scan, resolve and schedule the sources under `cwd`.
pub fn analyze(cwd: &Path, opts: &BuildOptions) -> Result<Analysis> {
    let filter = SourceFilter::new(
        PatternSet::new(&opts.source_patterns).context("invalid source pattern")?,
        PatternSet::new(&opts.exclude_patterns).context("invalid exclude pattern")?,
    );
    let headers = PatternSet::new(&opts.header_patterns).context("invalid header pattern")?;

    let roots = if opts.sources.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        opts.sources.clone()
    };
    let files = discover(cwd, &roots, &filter, opts.absolute_paths)?;
    tracing::debug!("discovered {} file(s)", files.len());

    let mut ctx = ScanContext::new(cwd, headers);
    ctx.scan_files(files)?;

    let graph = DependencyGraph::build(&ctx);
    let schedule = schedule(&graph)?;
    tracing::debug!(
        "{} file(s) scheduled in {} step(s)",
        graph.len(),
        schedule.len()
    );

    Ok(Analysis { graph, schedule })
}

/// Emit the plan for an analysed tree.
pub fn plan(
    cwd: &Path,
    opts: &BuildOptions,
    analysis: &Analysis,
    toolchain: &dyn Toolchain,
) -> BuildPlan {
    let anchor = |dir: &Path| {
        if opts.absolute_paths {
            normalize_lexically(&cwd.join(dir))
        } else {
            dir.to_path_buf()
        }
    };
    let emit_opts = EmitOptions {
        obj_dir: anchor(&opts.obj_dir),
        out_dir: anchor(&opts.out_dir),
        outputs: opts.effective_outputs(),
        incremental: opts.incremental,
        keep_intermediates: opts.keep_intermediates,
        root: cwd.to_path_buf(),
    };
    emit(&analysis.graph, &analysis.schedule, toolchain, &emit_opts)
}

/// Build the sources of the working directory with real processes.
pub fn build(ctx: &GlobalContext, opts: &BuildOptions) -> Result<BuildResult> {
    let toolchain = opts.toolchain();
    if !opts.dry_run && find_executable(&toolchain.compiler_path().to_string_lossy()).is_none() {
        bail!(
            "C++ compiler `{}` not found\n\
             hint: pass --compiler or set `build.compiler` in .gantry/config.toml",
            toolchain.compiler_path().display()
        );
    }

    let runner = ProcessRunner::new(ctx.cwd());
    build_with(ctx, opts, &toolchain, &runner)
}

/// Build with an explicit toolchain and command runner.
pub fn build_with<R: CommandRunner>(
    ctx: &GlobalContext,
    opts: &BuildOptions,
    toolchain: &dyn Toolchain,
    runner: &R,
) -> Result<BuildResult> {
    let cwd = ctx.cwd();
    let analysis = analyze(cwd, opts)?;
    let plan = plan(cwd, opts, &analysis, toolchain);

    let warnings = analysis.graph.warnings();
    for warning in &warnings {
        diagnostic::emit(warning, opts.color);
    }

    let report = render_all(&opts.show, &analysis.graph, &analysis.schedule, &plan)?;
    if !report.is_empty() {
        print!("{}", report);
    }

    if opts.emit_compile_commands {
        let cc_path = cwd.join("compile_commands.json");
        plan.emit_compile_commands(cwd, &cc_path)?;
        tracing::info!("Wrote {}", cc_path.display());
    }

    if opts.dry_run {
        return Ok(BuildResult {
            plan,
            report,
            summary: None,
            warnings,
        });
    }

    if plan.fresh > 0 {
        tracing::info!("{} object(s) up to date", plan.fresh);
    }

    let summary = BuildExecutor::new(runner, cwd)
        .jobs(opts.jobs)
        .verbose(opts.verbose || ctx.is_verbose())
        .execute(&plan)?;

    Ok(BuildResult {
        plan,
        report,
        summary: Some(summary),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Action;
    use crate::core::Kind;
    use crate::graph::GraphError;
    use crate::test_support::{set_mtime, MockRunner, ProjectFixture};
    use std::fs;
    use tempfile::TempDir;

    fn project(fixture: ProjectFixture) -> (TempDir, GlobalContext) {
        let tmp = TempDir::new().unwrap();
        fixture.write_to(tmp.path()).unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path());
        (tmp, ctx)
    }

    fn toolchain() -> GccToolchain {
        GccToolchain::new("g++", "ar")
    }

    #[test]
    fn test_analyze_hello_module() {
        let (tmp, _) = project(ProjectFixture::hello_module());
        let analysis = analyze(tmp.path(), &BuildOptions::default()).unwrap();
        let graph = &analysis.graph;

        assert_eq!(graph.kind(Path::new("src/hello.cppm")), Some(Kind::PrimaryModuleInterface));
        assert_eq!(graph.kind(Path::new("src/hello.cpp")), Some(Kind::ModuleUnit));
        assert_eq!(graph.kind(Path::new("src/greeting.h")), Some(Kind::HeaderUnit));

        let order = analysis.schedule.step_index();
        assert!(order[Path::new("src/greeting.h")] < order[Path::new("src/hello.cppm")]);
        assert!(order[Path::new("src/hello.cppm")] < order[Path::new("src/hello.cpp")]);
        assert!(order[Path::new("src/hello.cppm")] < order[Path::new("src/main.cpp")]);
    }

    #[test]
    fn test_analyze_partitions() {
        let (tmp, _) = project(ProjectFixture::partitioned());
        let analysis = analyze(tmp.path(), &BuildOptions::default()).unwrap();
        let order = analysis.schedule.step_index();

        assert!(order[Path::new("src/circle.cppm")] < order[Path::new("src/shapes.cppm")]);
        assert!(order[Path::new("src/detail.cpp")] < order[Path::new("src/shapes.cppm")]);
        assert!(order[Path::new("src/shapes.cppm")] < order[Path::new("src/main.cpp")]);
    }

    #[test]
    fn test_cycle_aborts_before_planning() {
        let (tmp, _) = project(
            ProjectFixture::new()
                .with_file("a.cppm", "export module a;\nimport b;\n")
                .with_file("b.cppm", "export module b;\nimport a;\n"),
        );
        let err = analyze(tmp.path(), &BuildOptions::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GraphError>(),
            Some(GraphError::Cycle { .. })
        ));
    }

    #[test]
    fn test_dry_run_runs_nothing() {
        let (_tmp, ctx) = project(ProjectFixture::hello_module());
        let runner = MockRunner::new(ctx.cwd());
        let opts = BuildOptions {
            dry_run: true,
            show: vec![ShowKind::Order],
            ..BuildOptions::default()
        };
        let result = build_with(&ctx, &opts, &toolchain(), &runner).unwrap();

        assert!(result.summary.is_none());
        assert!(runner.commands().is_empty());
        assert!(result.report.contains("\"src/main.cpp\""));
        assert!(!ctx.cwd().join("obj").exists());
    }

    #[test]
    fn test_default_output_is_myprog() {
        let (_tmp, ctx) = project(ProjectFixture::hello_module());
        let runner = MockRunner::new(ctx.cwd());
        let result = build_with(&ctx, &BuildOptions::default(), &toolchain(), &runner).unwrap();

        let summary = result.summary.unwrap();
        assert_eq!(summary.artifacts, vec![PathBuf::from("myprog")]);
        assert!(ctx.cwd().join("myprog").exists());
        assert!(!ctx.cwd().join("obj").exists());
    }

    #[test]
    fn test_shared_lib_compiles_pic() {
        let (_tmp, ctx) = project(ProjectFixture::hello_module());
        let runner = MockRunner::new(ctx.cwd());
        let opts = BuildOptions {
            outputs: vec![(OutputKind::SharedLib, "hello".to_string())],
            dry_run: true,
            ..BuildOptions::default()
        };
        let result = build_with(&ctx, &opts, &opts.toolchain(), &runner).unwrap();
        assert!(result
            .plan
            .actions()
            .filter(|a| matches!(a, Action::Compile(_)))
            .all(|a| a.shell_text().contains("-fPIC")));
        assert_eq!(result.plan.link_count(), 1);
    }

    #[test]
    fn test_incremental_second_run_compiles_nothing() {
        let (_tmp, ctx) = project(ProjectFixture::hello_module());
        let runner = MockRunner::new(ctx.cwd());
        let opts = BuildOptions {
            incremental: true,
            keep_intermediates: true,
            ..BuildOptions::default()
        };

        let first = build_with(&ctx, &opts, &toolchain(), &runner).unwrap();
        assert_eq!(first.plan.compile_count(), 4);

        // Pin timestamps so sources < objects < output regardless of the
        // filesystem's clock resolution.
        let now = std::time::SystemTime::now();
        let at = |secs: u64| now - std::time::Duration::from_secs(secs);
        for source in ["src/hello.cppm", "src/hello.cpp", "src/main.cpp", "src/greeting.h"] {
            set_mtime(&ctx.cwd().join(source), at(300));
        }
        for object in &first.plan.objects {
            set_mtime(&ctx.cwd().join(object), at(200));
        }
        set_mtime(&ctx.cwd().join("myprog"), at(100));

        runner.clear();
        let second = build_with(&ctx, &opts, &toolchain(), &runner).unwrap();
        assert_eq!(second.plan.compile_count(), 0);
        assert_eq!(second.plan.link_count(), 0);
        assert_eq!(second.plan.fresh, 4);
        assert!(runner.commands().is_empty());

        fs::remove_file(ctx.cwd().join("myprog")).unwrap();
        let third = build_with(&ctx, &opts, &toolchain(), &runner).unwrap();
        assert_eq!(third.plan.compile_count(), 0);
        assert_eq!(third.plan.link_count(), 1);
    }

    #[test]
    fn test_incremental_tracks_includes_outside_the_scan() {
        let (_tmp, ctx) = project(
            ProjectFixture::new()
                .with_file(
                    "src/a.cpp",
                    "#include \"impl.inl\"\n#include \"../include/x.h\"\nint main() {}\n",
                )
                .with_file("src/impl.inl", "inline int f() { return 1; }\n")
                .with_file("include/x.h", "int g();\n"),
        );
        let runner = MockRunner::new(ctx.cwd());
        let opts = BuildOptions {
            sources: vec![PathBuf::from("src")],
            incremental: true,
            keep_intermediates: true,
            ..BuildOptions::default()
        };

        let first = build_with(&ctx, &opts, &toolchain(), &runner).unwrap();
        assert_eq!(first.plan.compile_count(), 1);

        let now = std::time::SystemTime::now();
        let at = |secs: u64| now - std::time::Duration::from_secs(secs);
        let pin = || {
            for input in ["src/a.cpp", "src/impl.inl", "include/x.h"] {
                set_mtime(&ctx.cwd().join(input), at(300));
            }
            set_mtime(&ctx.cwd().join("obj/src/a.cpp.o"), at(200));
            set_mtime(&ctx.cwd().join("myprog"), at(100));
        };

        pin();
        let unchanged = build_with(&ctx, &opts, &toolchain(), &runner).unwrap();
        assert_eq!(unchanged.plan.compile_count(), 0);

        for touched in ["src/impl.inl", "include/x.h"] {
            pin();
            set_mtime(&ctx.cwd().join(touched), now);
            let rebuilt = build_with(&ctx, &opts, &toolchain(), &runner).unwrap();
            assert_eq!(rebuilt.plan.compile_count(), 1, "touched {}", touched);
        }
    }

    #[test]
    fn test_unanchored_partition_import_is_reported() {
        let (_tmp, ctx) = project(
            ProjectFixture::new()
                .with_file("src/a.cpp", "import :part;\nmodule foo;\n")
                .with_file("src/foo.cppm", "export module foo;\n"),
        );
        let runner = MockRunner::new(ctx.cwd());
        let opts = BuildOptions {
            dry_run: true,
            ..BuildOptions::default()
        };
        let result = build_with(&ctx, &opts, &toolchain(), &runner).unwrap();

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(
            result.warnings[0].location.as_deref(),
            Some(Path::new("src/a.cpp"))
        );
    }

    #[test]
    fn test_failed_compile_cleans_up() {
        let (_tmp, ctx) = project(ProjectFixture::hello_module());
        let runner = MockRunner::new(ctx.cwd()).failing_on("src/main.cpp");
        let err = build_with(&ctx, &BuildOptions::default(), &toolchain(), &runner).unwrap_err();

        assert!(err.to_string().contains("src/main.cpp"));
        assert!(!ctx.cwd().join("obj").exists());
        assert!(!ctx.cwd().join("myprog").exists());
    }

    #[test]
    fn test_emit_compile_commands() {
        let (_tmp, ctx) = project(ProjectFixture::hello_module());
        let runner = MockRunner::new(ctx.cwd());
        let opts = BuildOptions {
            dry_run: true,
            emit_compile_commands: true,
            ..BuildOptions::default()
        };
        build_with(&ctx, &opts, &toolchain(), &runner).unwrap();

        let json = fs::read_to_string(ctx.cwd().join("compile_commands.json")).unwrap();
        let entries: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(entries.len(), 4);
        assert!(entries.iter().any(|e| e["file"] == "src/hello.cppm"));
    }

    #[test]
    fn test_missing_source_root_is_an_error() {
        let (tmp, _) = project(ProjectFixture::hello_module());
        let opts = BuildOptions {
            sources: vec![PathBuf::from("nope")],
            ..BuildOptions::default()
        };
        let err = analyze(tmp.path(), &opts).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
