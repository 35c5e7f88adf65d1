//! High-level operations.
//!
//! This module contains the implementation of Gantry commands.

pub mod clean;
pub mod gantry_build;
pub mod show;

pub use clean::clean;
pub use gantry_build::{analyze, build, build_with, Analysis, BuildOptions, BuildResult};
pub use show::{render_all, ShowKind};
