//! Path pattern matching for source discovery and header detection.
//!
//! Relative patterns match from the right, one glob per path component:
//! `*.h` matches `a/b/c.h` and `tests/*` matches `x/tests/y.cpp`. Absolute
//! patterns must match the entire path.

use std::path::{Component, Path};

use anyhow::{Context, Result};
use glob::Pattern;

/// A single component-wise path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    absolute: bool,
    parts: Vec<Pattern>,
}

impl PathPattern {
    /// Compile a pattern such as `*.cpp` or `src/*/gen_*.h`.
    pub fn new(raw: &str) -> Result<Self> {
        let absolute = Path::new(raw).has_root();
        let parts = components(Path::new(raw))
            .map(|part| {
                Pattern::new(part).with_context(|| format!("invalid pattern: {}", raw))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PathPattern {
            raw: raw.to_string(),
            absolute,
            parts,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check whether `path` matches this pattern.
    pub fn matches(&self, path: &Path) -> bool {
        if self.parts.is_empty() {
            return false;
        }

        let names: Vec<&str> = components(path).collect();
        if self.absolute {
            if !path.has_root() || names.len() != self.parts.len() {
                return false;
            }
        } else if names.len() < self.parts.len() {
            return false;
        }

        let tail = &names[names.len() - self.parts.len()..];
        self.parts
            .iter()
            .zip(tail)
            .all(|(pattern, name)| pattern.matches(name))
    }
}

/// A set of patterns; a path matches the set if it matches any member.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<PathPattern>,
}

impl PatternSet {
    /// Compile every non-empty pattern in `raw`.
    pub fn new<I, S>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns = Vec::new();
        for pattern in raw {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() || patterns.iter().any(|p: &PathPattern| p.as_str() == pattern) {
                continue;
            }
            patterns.push(PathPattern::new(pattern)?);
        }
        Ok(PatternSet { patterns })
    }

    /// Whether any pattern matches `path`.
    pub fn matches(&self, path: &Path) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }

    /// Whether the set holds no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}

fn components(path: &Path) -> impl Iterator<Item = &str> {
    path.components().filter_map(|c| match c {
        Component::Normal(name) => name.to_str(),
        Component::ParentDir => Some(".."),
        _ => None,
    })
}
