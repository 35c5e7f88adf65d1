//! Terminal rendering of fatal errors.
//!
//! Typed errors convert themselves into a [`Diagnostic`]: a headline, the
//! file it concerns, a few note lines and one piece of advice.

use std::fmt;
use std::path::PathBuf;

/// Advice attached to the errors gantry reports.
pub mod suggestions {
    pub const BREAK_CYCLE: &str =
        "Break the cycle by moving shared declarations into a header or partition";

    pub const DUPLICATE_MODULE: &str =
        "Rename one of the modules or exclude one file with `--exclude`";

    pub const UNREADABLE: &str = "Check that the file exists and is readable";

    pub const DECLARE_MODULE_FIRST: &str =
        "Put the `module` or `export module` declaration before partition imports";

    pub const BUILD_FAILED: &str = "Run `gantry build --verbose` to see every command";
}

/// How bad it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(&self, color: bool) -> &'static str {
        match (self, color) {
            (Severity::Error, false) => "error",
            (Severity::Warning, false) => "warning",
            (Severity::Error, true) => "\x1b[1;31merror\x1b[0m",
            (Severity::Warning, true) => "\x1b[1;33mwarning\x1b[0m",
        }
    }
}

/// A rendered error report.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// File the report is about
    pub location: Option<PathBuf>,
    /// Extra lines shown under the headline
    pub notes: Vec<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create an error.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            location: None,
            notes: Vec::new(),
            help: None,
        }
    }

    /// Create a warning.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(message)
        }
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Add a note line. Multi-line notes are indented as a block.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render for the terminal, with ANSI colors if `color` is set.
    pub fn format(&self, color: bool) -> String {
        let mut out = format!("{}: {}\n", self.severity.label(color), self.message);

        if let Some(path) = &self.location {
            out.push_str(&format!("  --> {}\n", path.display()));
        }

        for note in &self.notes {
            let mut lines = note.lines();
            if let Some(first) = lines.next() {
                out.push_str(&format!("  = {}\n", first));
            }
            for line in lines {
                out.push_str(&format!("    {}\n", line));
            }
        }

        if let Some(help) = &self.help {
            let label = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            out.push_str(&format!("{}: {}\n", label, help));
        }

        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
