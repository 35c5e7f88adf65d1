//! Source trees for tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A source tree written to disk on demand.
#[derive(Debug, Clone, Default)]
pub struct ProjectFixture {
    /// Files (path relative to project root -> content).
    pub files: BTreeMap<PathBuf, String>,
}

impl ProjectFixture {
    /// Create a new empty project fixture.
    pub fn new() -> Self {
        ProjectFixture::default()
    }

    /// A named module, one implementation unit and a program importing it.
    pub fn hello_module() -> Self {
        ProjectFixture::new()
            .with_file("src/hello.cppm", sources::HELLO_INTERFACE)
            .with_file("src/hello.cpp", sources::HELLO_IMPL)
            .with_file("src/main.cpp", sources::HELLO_MAIN)
            .with_file("src/greeting.h", sources::GREETING_HEADER)
    }

    /// A module split into an interface partition and an internal partition.
    pub fn partitioned() -> Self {
        ProjectFixture::new()
            .with_file(
                "src/shapes.cppm",
                "export module shapes;\nexport import :circle;\nimport :detail;\n",
            )
            .with_file(
                "src/circle.cppm",
                "export module shapes:circle;\nexport double area(double r);\n",
            )
            .with_file("src/detail.cpp", "module shapes:detail;\nint helper();\n")
            .with_file("src/main.cpp", "import shapes;\nint main() { return 0; }\n")
    }

    /// Add a file.
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Write this fixture under `base_path`.
    pub fn write_to(&self, base_path: &Path) -> std::io::Result<()> {
        for (rel_path, content) in &self.files {
            let full_path = base_path.join(rel_path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&full_path, content)?;
        }
        Ok(())
    }
}

/// Source snippets.
pub mod sources {
    pub const HELLO_INTERFACE: &str = "\
module;
#include <string>
export module hello;
import \"greeting.h\";
export std::string hello();
";

    pub const HELLO_IMPL: &str = "\
module hello;
std::string hello() { return greeting(); }
";

    pub const HELLO_MAIN: &str = "\
#include <iostream>
import hello;
int main() { std::cout << hello() << '\\n'; }
";

    pub const GREETING_HEADER: &str = "\
#pragma once
#include <string>
inline std::string greeting() { return \"hello\"; }
";
}
