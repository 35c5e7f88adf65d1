//! Source file classification types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::module_name::ModuleName;

/// What a source file is, as far as the build is concerned.
///
/// Exactly one kind applies to a file once it enters the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Kind {
    /// Textually included, never compiled on its own.
    Header,
    /// Imported with `import "x.h";`, precompiled into an importable unit.
    HeaderUnit,
    /// Imported with `import <x>;`. Provided by the compiler, never a file node.
    SystemHeaderUnit,
    /// Ordinary translation unit with no module declaration.
    GlobalUnit,
    /// `module foo;` implementation unit.
    ModuleUnit,
    /// `export module foo;`
    PrimaryModuleInterface,
    /// `module foo:part;`
    ModulePartition,
    /// `export module foo:part;`
    ModulePartitionInterface,
}

impl Kind {
    /// Get the kind as its display string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Header => "header",
            Kind::HeaderUnit => "header-unit",
            Kind::SystemHeaderUnit => "system-header-unit",
            Kind::GlobalUnit => "global-unit",
            Kind::ModuleUnit => "module-unit",
            Kind::PrimaryModuleInterface => "primary-module-interface",
            Kind::ModulePartition => "module-partition",
            Kind::ModulePartitionInterface => "module-partition-interface",
        }
    }

    /// Whether files of this kind produce an object file.
    pub fn is_compiled(&self) -> bool {
        !matches!(self, Kind::Header | Kind::SystemHeaderUnit)
    }

    /// Whether this is one of the two partition kinds.
    pub fn is_partition(&self) -> bool {
        matches!(self, Kind::ModulePartition | Kind::ModulePartitionInterface)
    }

    /// Whether this kind makes its module name resolvable by importers.
    pub fn exports_name(&self) -> bool {
        matches!(
            self,
            Kind::PrimaryModuleInterface | Kind::ModulePartition | Kind::ModulePartitionInterface
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification result for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// File kind
    pub kind: Kind,
    /// Module declared by the file, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<ModuleName>,
}

impl SourceInfo {
    /// Create a new source info with no module name.
    pub fn new(kind: Kind) -> Self {
        SourceInfo {
            kind,
            module_name: None,
        }
    }

    /// Module name as a display string (empty if none).
    pub fn module_str(&self) -> &str {
        self.module_name.as_ref().map(|m| m.as_str()).unwrap_or("")
    }
}
