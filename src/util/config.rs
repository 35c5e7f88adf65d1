//! Configuration file support for Gantry.
//!
//! Gantry supports two configuration file locations:
//! - Global: `~/.gantry/config.toml` - User-wide defaults
//! - Project: `.gantry/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default patterns for files to inspect.
pub const DEFAULT_SOURCE_PATTERNS: &[&str] = &[
    "*.h", "*.c", "*.hxx", "*.cxx", "*.ixx", "*.mxx", "*.hpp", "*.cpp", "*.cppm",
];

/// Default patterns for files that are never compiled on their own.
pub const DEFAULT_HEADER_PATTERNS: &[&str] = &["*.h", "*.hpp", "*.hxx"];

/// Gantry configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// File pattern settings
    pub patterns: PatternConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// C++ compiler driver (e.g., /usr/bin/g++-13)
    pub compiler: Option<PathBuf>,

    /// Archiver for static libraries
    pub archiver: Option<PathBuf>,

    /// Extra flags passed to every compile and link command
    pub flags: Vec<String>,

    /// Directory for intermediate objects
    pub obj_dir: Option<PathBuf>,

    /// Directory for linked outputs
    pub out_dir: Option<PathBuf>,

    /// Number of parallel jobs (None = auto-detect)
    pub jobs: Option<usize>,

    /// Skip actions whose artifacts are up to date
    pub incremental: bool,

    /// Keep objects and the module cache after a successful build
    pub keep_intermediates: Option<bool>,

    /// Display absolute paths
    pub absolute_paths: bool,
}

/// Source and header pattern configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Patterns of files to inspect (replaces the defaults)
    pub sources: Vec<String>,

    /// Patterns added to `sources`
    pub extra_sources: Vec<String>,

    /// Patterns of files to skip
    pub exclude: Vec<String>,

    /// Patterns of files that are headers (replaces the defaults)
    pub headers: Vec<String>,

    /// Patterns added to `headers`
    pub extra_headers: Vec<String>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        PatternConfig {
            sources: DEFAULT_SOURCE_PATTERNS.iter().map(|s| s.to_string()).collect(),
            extra_sources: Vec::new(),
            exclude: Vec::new(),
            headers: DEFAULT_HEADER_PATTERNS.iter().map(|s| s.to_string()).collect(),
            extra_headers: Vec::new(),
        }
    }
}

impl PatternConfig {
    /// All source patterns (base plus extras).
    pub fn all_sources(&self) -> Vec<String> {
        self.sources
            .iter()
            .chain(&self.extra_sources)
            .cloned()
            .collect()
    }

    /// All header patterns (base plus extras).
    pub fn all_headers(&self) -> Vec<String> {
        self.headers
            .iter()
            .chain(&self.extra_headers)
            .cloned()
            .collect()
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        let defaults = PatternConfig::default();

        if other.build.compiler.is_some() {
            self.build.compiler = other.build.compiler;
        }
        if other.build.archiver.is_some() {
            self.build.archiver = other.build.archiver;
        }
        if !other.build.flags.is_empty() {
            self.build.flags = other.build.flags;
        }
        if other.build.obj_dir.is_some() {
            self.build.obj_dir = other.build.obj_dir;
        }
        if other.build.out_dir.is_some() {
            self.build.out_dir = other.build.out_dir;
        }
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.incremental {
            self.build.incremental = true;
        }
        if other.build.keep_intermediates.is_some() {
            self.build.keep_intermediates = other.build.keep_intermediates;
        }
        if other.build.absolute_paths {
            self.build.absolute_paths = true;
        }

        // Base pattern lists only override when they differ from the defaults,
        // so a config file that only adds extras keeps an earlier override.
        if other.patterns.sources != defaults.sources {
            self.patterns.sources = other.patterns.sources;
        }
        if other.patterns.headers != defaults.headers {
            self.patterns.headers = other.patterns.headers;
        }
        self.patterns.extra_sources.extend(other.patterns.extra_sources);
        self.patterns.extra_headers.extend(other.patterns.extra_headers);
        self.patterns.exclude.extend(other.patterns.exclude);
    }

    /// Whether intermediates survive a successful build.
    ///
    /// Defaults to keeping them in incremental mode.
    pub fn keep_intermediates(&self) -> bool {
        self.build.keep_intermediates.unwrap_or(self.build.incremental)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.gantry/config.toml)
/// 2. Global config (~/.gantry/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global gantry config directory (~/.gantry).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".gantry"))
}

/// Get the global config path (~/.gantry/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.gantry/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".gantry").join("config.toml")
}
