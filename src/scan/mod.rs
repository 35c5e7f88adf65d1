//! Source discovery and per-file classification.
//!
//! Discovery walks the source roots; classification reads one file's text and
//! reports its kind, module name and raw dependencies. Neither stage knows
//! about other files.

pub mod classify;
pub mod discover;

pub use classify::{classify, FileScan};
pub use discover::{discover, SourceFilter};
