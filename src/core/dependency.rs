//! Dependency edge targets.
//!
//! Files and module names live in two different namespaces. The classifier
//! produces [`RawDep`]s mixing both; name resolution turns them into [`Dep`]s
//! where every schedulable target is a file path and everything else is an
//! opaque [`ExternalDep`] leaf.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::core::module_name::ModuleName;

/// A dependency as found by the classifier, before name resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "type", content = "target", rename_all = "kebab-case")]
pub enum RawDep {
    /// `#include "x.h"` or `import "x.h";`, resolved against the importer.
    File(PathBuf),
    /// `import foo;` / `import :part;` (already anchored).
    Module(ModuleName),
    /// `#include <x>`
    SystemHeader(String),
    /// `import <x>;`
    SystemHeaderUnit(String),
}

/// A dependency target that is never scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "type", content = "target", rename_all = "kebab-case")]
pub enum ExternalDep {
    /// Module name no scanned file defines.
    Module(ModuleName),
    /// `#include <x>`
    SystemHeader(String),
    /// `import <x>;`
    SystemHeaderUnit(String),
    /// Quoted include of a file outside the scanned set.
    MissingFile(PathBuf),
}

/// A dependency after name resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Dep {
    /// A scanned file; imposes ordering.
    File(PathBuf),
    /// Satisfied leaf; imposes no ordering.
    External(ExternalDep),
}

impl Dep {
    /// The file path, if this is a real file dependency.
    pub fn as_file(&self) -> Option<&PathBuf> {
        match self {
            Dep::File(path) => Some(path),
            Dep::External(_) => None,
        }
    }
}

impl fmt::Display for ExternalDep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalDep::Module(name) => write!(f, "{}", name),
            ExternalDep::SystemHeader(h) | ExternalDep::SystemHeaderUnit(h) => {
                write!(f, "<{}>", h)
            }
            ExternalDep::MissingFile(path) => write!(f, "\"{}\"", path.display()),
        }
    }
}
