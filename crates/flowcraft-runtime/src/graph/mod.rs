//! Workflow graph model.
//!
//! [`WorkflowGraph`] holds the nodes and edges and enforces the structural
//! invariants on every edit. The [`dag`] functions check acyclicity and
//! produce execution orders, and [`WorkflowDocument`] is the JSON form used
//! for import, export and persistence.

pub mod dag;
mod document;
mod edge;
mod workflow;

pub use dag::{entry_nodes, execution_order, exit_nodes, validate_dag};
pub use document::WorkflowDocument;
pub use edge::Edge;
pub use workflow::WorkflowGraph;
