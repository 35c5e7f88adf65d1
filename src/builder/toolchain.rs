//! Compiler command syntax.
//!
//! The emitter decides *what* to build; a [`Toolchain`] decides how each step
//! is spelled on the command line. Only GCC understands the `-fmodules-ts`
//! header-unit flow used here, so [`GccToolchain`] is the one implementation.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::util::process::find_program;

/// A command to execute: program and arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    /// The program to run (e.g., "g++", "ar")
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Program followed by arguments, as a `compile_commands.json` argv.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.display().to_string());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

impl fmt::Display for CommandSpec {
    /// Shell text, quoting arguments that would otherwise be split.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program.display().to_string()))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

/// Quote `s` for a POSIX shell if it contains anything but safe characters.
pub fn shell_quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=+,:@%^".contains(c));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// Input for a compile or header-unit precompile step.
#[derive(Debug, Clone)]
pub struct CompileInput {
    /// Source file to compile
    pub source: PathBuf,
    /// Output object file
    pub output: PathBuf,
}

/// Input for an archive or link step.
#[derive(Debug, Clone)]
pub struct LinkInput {
    /// Object files, in link order
    pub objects: Vec<PathBuf>,
    /// Output file
    pub output: PathBuf,
}

/// Trait for toolchain implementations.
pub trait Toolchain: Send + Sync {
    /// Get the compiler driver path.
    fn compiler_path(&self) -> &Path;

    /// Precompile a header-unit.
    fn header_unit_command(&self, input: &CompileInput) -> CommandSpec;

    /// Compile a translation unit (module interface or not) to an object.
    fn compile_command(&self, input: &CompileInput) -> CommandSpec;

    /// Create a static library.
    fn archive_command(&self, input: &LinkInput) -> CommandSpec;

    /// Link a shared library.
    fn link_shared_command(&self, input: &LinkInput) -> CommandSpec;

    /// Link an executable.
    fn link_exe_command(&self, input: &LinkInput) -> CommandSpec;

    /// Directory where the compiler keeps compiled module interfaces.
    fn module_cache_dir(&self) -> Option<&Path>;
}

/// Default compiler when neither config nor `$CXX` name one.
pub const DEFAULT_CXX: &str = "g++";

/// Default archiver when neither config nor `$AR` name one.
pub const DEFAULT_AR: &str = "ar";

/// GCC with `-fmodules-ts`.
#[derive(Debug, Clone)]
pub struct GccToolchain {
    cxx: PathBuf,
    ar: PathBuf,
    flags: Vec<String>,
    pic: bool,
    module_cache: PathBuf,
}

impl GccToolchain {
    /// Create a toolchain from explicit tool paths.
    pub fn new(cxx: impl Into<PathBuf>, ar: impl Into<PathBuf>) -> Self {
        GccToolchain {
            cxx: cxx.into(),
            ar: ar.into(),
            flags: Vec::new(),
            pic: false,
            module_cache: PathBuf::from("gcm.cache"),
        }
    }

    /// Pick tools from configuration, then `$CXX`/`$AR`, then PATH.
    ///
    /// Falls back to plain `g++`/`ar` so that plans can be rendered on
    /// machines without a compiler.
    pub fn detect(cxx: Option<PathBuf>, ar: Option<PathBuf>) -> Self {
        let cxx = cxx
            .or_else(|| find_program("CXX", &["g++", "c++"]).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CXX));
        let ar = ar
            .or_else(|| find_program("AR", &["ar", "gcc-ar"]).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_AR));

        tracing::debug!("using compiler {} and archiver {}", cxx.display(), ar.display());
        GccToolchain::new(cxx, ar)
    }

    /// Extra flags appended to every compiler invocation.
    pub fn with_flags(mut self, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.flags.extend(flags.into_iter().map(Into::into));
        self
    }

    /// Compile objects as position independent code.
    pub fn with_pic(mut self, pic: bool) -> Self {
        self.pic = pic;
        self
    }

    fn language_args(&self) -> [&'static str; 3] {
        ["-x", "c++", "-std=c++20"]
    }
}

impl Toolchain for GccToolchain {
    fn compiler_path(&self) -> &Path {
        &self.cxx
    }

    fn header_unit_command(&self, input: &CompileInput) -> CommandSpec {
        CommandSpec::new(&self.cxx)
            .args(self.language_args())
            .arg("-fmodule-header")
            .arg(input.source.display().to_string())
            .arg("-c")
            .arg("-o")
            .arg(input.output.display().to_string())
            .args(self.flags.iter().cloned())
    }

    fn compile_command(&self, input: &CompileInput) -> CommandSpec {
        let cmd = CommandSpec::new(&self.cxx)
            .args(self.language_args())
            .arg("-fmodules-ts")
            .arg(input.source.display().to_string())
            .arg("-c")
            .arg("-o")
            .arg(input.output.display().to_string())
            .args(self.flags.iter().cloned());

        if self.pic {
            cmd.arg("-fPIC")
        } else {
            cmd
        }
    }

    fn archive_command(&self, input: &LinkInput) -> CommandSpec {
        CommandSpec::new(&self.ar)
            .arg("rvs")
            .arg(input.output.display().to_string())
            .args(input.objects.iter().map(|o| o.display().to_string()))
    }

    fn link_shared_command(&self, input: &LinkInput) -> CommandSpec {
        CommandSpec::new(&self.cxx)
            .args(input.objects.iter().map(|o| o.display().to_string()))
            .arg("-shared")
            .arg("-o")
            .arg(input.output.display().to_string())
            .args(self.flags.iter().cloned())
    }

    fn link_exe_command(&self, input: &LinkInput) -> CommandSpec {
        CommandSpec::new(&self.cxx)
            .args(input.objects.iter().map(|o| o.display().to_string()))
            .arg("-o")
            .arg(input.output.display().to_string())
            .args(self.flags.iter().cloned())
    }

    fn module_cache_dir(&self) -> Option<&Path> {
        Some(&self.module_cache)
    }
}
