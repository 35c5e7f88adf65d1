//! C++ module names.
//!
//! A module name is a dotted identifier (`std.core`), optionally followed by a
//! partition separated by a colon (`std.core:io`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A C++ module or partition name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    /// Partition separator.
    pub const SEPARATOR: char = ':';

    /// Create a module name from a string.
    pub fn new(name: impl Into<String>) -> Self {
        ModuleName(name.into())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The primary module part (`foo` for `foo:bar`).
    pub fn primary(&self) -> &str {
        match self.0.split_once(Self::SEPARATOR) {
            Some((primary, _)) => primary,
            None => &self.0,
        }
    }

    /// The partition part, if any (`bar` for `foo:bar`).
    pub fn partition(&self) -> Option<&str> {
        self.0.split_once(Self::SEPARATOR).map(|(_, part)| part)
    }

    /// Whether this is a partition name.
    pub fn is_partition(&self) -> bool {
        self.partition().is_some()
    }

    /// Whether this name is relative to the importing module (`:part`).
    pub fn is_relative(&self) -> bool {
        self.0.starts_with(Self::SEPARATOR)
    }

    /// Anchor a relative partition name onto the primary module of `owner`.
    ///
    /// With no owner the name is returned unchanged and stays unresolvable.
    pub fn anchored_to(&self, owner: Option<&ModuleName>) -> ModuleName {
        if !self.is_relative() {
            return self.clone();
        }
        match owner {
            Some(owner) => ModuleName(format!("{}{}", owner.primary(), self.0)),
            None => self.clone(),
        }
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleName {
    fn from(s: &str) -> Self {
        ModuleName::new(s)
    }
}
