//! Lathe Tasks - declaration parsing, dependency resolution and execution
//!
//! This crate turns a Makefile-style declaration into a task graph, resolves
//! requested targets into an ordered invocation plan and runs the plan
//! through the shell.

pub mod declaration;
pub mod error;
pub mod executor;
pub mod graph;
pub mod plan;
pub mod reporter;
pub mod resolver;
pub mod target;

pub use declaration::{parse, DeclarationParser};
pub use error::{ParseError, ParseErrorKind, Result, TaskError};
pub use executor::{
    exit_code, shutdown_signal, ExecutionReport, Executor, ExecutorOptions, TargetResult,
    TargetStatus, TARGET_ENV_VAR,
};
pub use graph::TaskGraph;
pub use plan::InvocationPlan;
pub use reporter::{CollectingReporter, TaskEvent, TaskReporter, TaskReporterRegistry, TracingReporter};
pub use resolver::{resolve, resolve_request};
pub use target::{CommandLine, Target};
