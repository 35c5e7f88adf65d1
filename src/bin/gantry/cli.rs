//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use gantry::builder::OutputKind;
use gantry::ops::{BuildOptions, ShowKind};
use gantry::util::Config;

/// Gantry - scan, order and build C++20 module sources
#[derive(Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan sources, then compile and link them in dependency order
    Build(BuildArgs),

    /// Print reports about the sources without building
    Show(ShowArgs),

    /// Remove intermediate objects and the module cache
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Which files are scanned and how they are named.
#[derive(Args)]
pub struct SourceArgs {
    /// Source files and directories to inspect recursively [default: .]
    pub sources: Vec<PathBuf>,

    /// Patterns of files to inspect (replaces the defaults)
    #[arg(long, value_delimiter = ',')]
    pub patterns: Option<Vec<String>>,

    /// Additional patterns of files to inspect
    #[arg(long, value_delimiter = ',')]
    pub patterns_add: Vec<String>,

    /// Patterns of files to skip
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Patterns of files that are headers (replaces the defaults)
    #[arg(long, value_delimiter = ',')]
    pub headers: Option<Vec<String>>,

    /// Additional patterns of files that are headers
    #[arg(long, value_delimiter = ',')]
    pub headers_add: Vec<String>,

    /// Identify and display files by absolute path
    #[arg(long)]
    pub absolute_paths: bool,
}

impl SourceArgs {
    /// Apply on top of configuration-derived options.
    pub fn apply(self, opts: &mut BuildOptions, config: &Config) {
        if !self.sources.is_empty() {
            opts.sources = self.sources;
        }
        if let Some(patterns) = self.patterns {
            opts.source_patterns = patterns;
            opts.source_patterns
                .extend(config.patterns.extra_sources.iter().cloned());
        }
        opts.source_patterns.extend(self.patterns_add);
        opts.exclude_patterns.extend(self.exclude);
        if let Some(headers) = self.headers {
            opts.header_patterns = headers;
            opts.header_patterns
                .extend(config.patterns.extra_headers.iter().cloned());
        }
        opts.header_patterns.extend(self.headers_add);
        opts.absolute_paths |= self.absolute_paths;
    }
}

/// What is produced and how.
#[derive(Args)]
pub struct PlanArgs {
    /// Link an executable NAME
    #[arg(long, value_name = "NAME")]
    pub exe: Option<String>,

    /// Create a static library libNAME.a
    #[arg(long, value_name = "NAME")]
    pub lib: Option<String>,

    /// Link a shared library libNAME.so
    #[arg(long, value_name = "NAME")]
    pub so: Option<String>,

    /// C++ compiler driver
    #[arg(long, value_name = "PATH")]
    pub compiler: Option<PathBuf>,

    /// Additional flags for every compile and link command
    #[arg(long, allow_hyphen_values = true)]
    pub flags: Option<String>,

    /// Directory for intermediate objects
    #[arg(long, value_name = "DIR")]
    pub obj_dir: Option<PathBuf>,

    /// Directory for linked outputs
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Skip compiles and links whose outputs are up to date
    #[arg(long)]
    pub incremental: bool,

    /// Remove intermediates after building, even when incremental
    #[arg(long)]
    pub no_cache: bool,
}

impl PlanArgs {
    /// Apply on top of configuration-derived options.
    pub fn apply(self, opts: &mut BuildOptions, config: &Config) {
        if let Some(name) = self.lib {
            opts.outputs.push((OutputKind::StaticLib, name));
        }
        if let Some(name) = self.so {
            opts.outputs.push((OutputKind::SharedLib, name));
        }
        if let Some(name) = self.exe {
            opts.outputs.push((OutputKind::Executable, name));
        }
        if self.compiler.is_some() {
            opts.compiler = self.compiler;
        }
        if let Some(flags) = self.flags {
            opts.flags = flags.split_whitespace().map(str::to_string).collect();
        }
        if let Some(dir) = self.obj_dir {
            opts.obj_dir = dir;
        }
        if let Some(dir) = self.out_dir {
            opts.out_dir = dir;
        }
        if self.jobs.is_some() {
            opts.jobs = self.jobs;
        }
        if self.incremental {
            opts.incremental = true;
            opts.keep_intermediates = config.build.keep_intermediates.unwrap_or(true);
        }
        if self.no_cache {
            opts.keep_intermediates = false;
        }
    }
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub plan: PlanArgs,

    /// Reports to print first: list, deps, order, cmd, plan
    #[arg(long, value_delimiter = ',')]
    pub show: Vec<ShowKind>,

    /// Do not run any command
    #[arg(long)]
    pub dry_run: bool,

    /// Write compile_commands.json
    #[arg(long)]
    pub emit_compile_commands: bool,
}

/// Comma-separated report list.
#[derive(Debug, Clone)]
pub struct Reports(pub Vec<ShowKind>);

fn parse_reports(s: &str) -> Result<Reports, String> {
    s.split(',')
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect::<Result<Vec<_>, _>>()
        .map(Reports)
}

#[derive(Args)]
pub struct ShowArgs {
    /// Reports to print, comma separated: list, deps, order, cmd, plan
    #[arg(value_name = "REPORTS", value_parser = parse_reports)]
    pub reports: Reports,

    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub plan: PlanArgs,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Directory for intermediate objects
    #[arg(long, value_name = "DIR")]
    pub obj_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
