//! Core data structures for Gantry.
//!
//! This module contains the foundational types shared by every stage:
//! - Source file kinds and classification results
//! - Module names
//! - Dependency targets across the path and module-name namespaces

pub mod dependency;
pub mod module_name;
pub mod source;

pub use dependency::{Dep, ExternalDep, RawDep};
pub use module_name::ModuleName;
pub use source::{Kind, SourceInfo};
