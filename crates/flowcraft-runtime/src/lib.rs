#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod engine;
mod error;
pub mod graph;
pub mod node;
pub mod run;
mod session;

#[doc(hidden)]
pub mod prelude;

pub use error::{CycleError, NodeError, WorkflowError, WorkflowResult};
pub use session::WorkflowSession;

/// Tracing target for runtime operations.
pub const TRACING_TARGET: &str = "flowcraft_runtime";
