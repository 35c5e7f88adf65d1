//! Gantry - a build driver for C++20 modules
//!
//! This crate scans C++ sources for `#include`, `import` and `module`
//! directives, orders them so that every module interface is compiled before
//! its importers, and drives the compiler through the resulting plan.

pub mod builder;
pub mod core;
pub mod graph;
pub mod ops;
pub mod scan;
pub mod util;

/// Test utilities and mocks for Gantry unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a recording command runner and source tree
/// fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{Dep, Kind, ModuleName, SourceInfo};
pub use graph::{DependencyGraph, Schedule};
pub use util::context::GlobalContext;
