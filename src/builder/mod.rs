//! C++ module build planning and execution.
//!
//! [`emitter::emit`] turns a scheduled [`DependencyGraph`](crate::graph::DependencyGraph)
//! into a [`BuildPlan`], consulting the [`StalenessOracle`] in incremental
//! mode; [`BuildExecutor`] runs the plan through a [`CommandRunner`].

pub mod emitter;
pub mod executor;
pub mod plan;
pub mod staleness;
pub mod toolchain;

pub use emitter::{emit, EmitOptions};
pub use executor::{BuildExecutor, CommandRunner, ExecError, ExecSummary, ProcessRunner};
pub use plan::{Action, ActionGroup, BuildPlan, OutputKind, Phase};
pub use staleness::StalenessOracle;
pub use toolchain::{CommandSpec, GccToolchain, Toolchain};
