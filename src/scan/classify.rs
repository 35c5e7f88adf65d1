//! Line-oriented directive scanner.
//!
//! Each line is split into at most four whitespace-separated tokens and the
//! leading tokens are matched against `#include`, `import`, `export import`,
//! `module` and `export module`. This is a heuristic, not a preprocessor:
//!
//! - directives split over several lines or continued with `\` are not seen
//! - `# include` (space after the hash) is not seen
//! - directives produced by macros are not seen
//! - directives inside comments, `#if 0` blocks or inactive conditional
//!   branches ARE seen, since nothing is evaluated
//!
//! Callers get exactly what the text says, nothing more.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::core::{Kind, ModuleName, RawDep, SourceInfo};
use crate::util::fs::normalize_lexically;

static QUOTED_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"([\w/.\-\\]+)""#).expect("quoted path regex"));

static ANGLE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<([^<>\s]+)>").expect("angle path regex"));

static MODULE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w.:]+)").expect("module name regex"));

/// Result of scanning one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileScan {
    /// Kind and module name of the scanned file itself
    pub info: SourceInfo,
    /// Dependencies in the order they were found; may contain duplicates
    pub deps: Vec<RawDep>,
    /// Files imported as header-units by this file
    pub header_units: Vec<PathBuf>,
}

impl FileScan {
    fn new(default_kind: Kind) -> Self {
        FileScan {
            info: SourceInfo::new(default_kind),
            deps: Vec::new(),
            header_units: Vec::new(),
        }
    }

    fn include(&mut self, dir: &Path, arg: &str) {
        if let Some(m) = QUOTED_PATH.captures(arg) {
            self.deps
                .push(RawDep::File(normalize_lexically(&dir.join(&m[1]))));
        } else if let Some(m) = ANGLE_PATH.captures(arg) {
            self.deps.push(RawDep::SystemHeader(m[1].to_string()));
        }
    }

    fn import(&mut self, dir: &Path, arg: &str) {
        if let Some(m) = ANGLE_PATH.captures(arg) {
            self.deps.push(RawDep::SystemHeaderUnit(m[1].to_string()));
        } else if let Some(m) = QUOTED_PATH.captures(arg) {
            let target = normalize_lexically(&dir.join(&m[1]));
            self.header_units.push(target.clone());
            self.deps.push(RawDep::File(target));
        } else if let Some(m) = MODULE_NAME.captures(arg) {
            let name = ModuleName::new(&m[1]).anchored_to(self.info.module_name.as_ref());
            self.deps.push(RawDep::Module(name));
        }
    }

    fn declare(&mut self, arg: &str, export: bool) {
        let Some(m) = MODULE_NAME.captures(arg) else {
            return;
        };
        let name = ModuleName::new(&m[1]);

        // `module :private;` and friends name no module of their own.
        if name.primary().is_empty() || name.partition() == Some("") {
            tracing::trace!("ignoring module declaration `{}`", name);
            return;
        }

        self.info.kind = match (name.is_partition(), export) {
            (true, true) => Kind::ModulePartitionInterface,
            (true, false) => Kind::ModulePartition,
            (false, true) => Kind::PrimaryModuleInterface,
            (false, false) => Kind::ModuleUnit,
        };
        self.info.module_name = Some(name);
    }
}

/// Scan `content`, the text of the file at `path`.
///
/// `default_kind` is what the file is when no module declaration is found:
/// [`Kind::Header`] for header-pattern matches, [`Kind::GlobalUnit`] otherwise.
pub fn classify(path: &Path, content: &str, default_kind: Kind) -> FileScan {
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let mut scan = FileScan::new(default_kind);

    for line in content.lines() {
        let words: Vec<&str> = line.split_whitespace().take(4).collect();

        match words.as_slice() {
            ["#include", arg, ..] => scan.include(dir, arg),
            ["import", arg, ..] | ["export", "import", arg, ..] => scan.import(dir, arg),
            ["module", arg, ..] => scan.declare(arg, false),
            ["export", "module", arg, ..] => scan.declare(arg, true),
            _ => {}
        }
    }

    scan
}
