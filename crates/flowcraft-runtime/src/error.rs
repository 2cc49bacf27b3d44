//! Workflow error types.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::NodeId;
use crate::run::WorkflowRun;

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Errors that abort a workflow operation as a whole.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The graph contains a cycle.
    #[error(transparent)]
    Cycle(#[from] CycleError),

    /// A run was refused because its graph contains a cycle.
    ///
    /// `run` is the failed run record that was reported and persisted.
    #[error("{cycle}")]
    CyclicRun {
        /// The cycle that was found.
        #[source]
        cycle: CycleError,
        /// The failed run.
        run: Box<WorkflowRun>,
    },

    /// Workflow definition is invalid.
    #[error("invalid workflow definition: {0}")]
    InvalidDefinition(String),

    /// A referenced node does not exist.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Run store operation failed.
    #[error("run store error: {0}")]
    Store(#[from] flowcraft_core::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WorkflowError {
    /// Returns the cycle behind this error, if any.
    pub fn cycle(&self) -> Option<&CycleError> {
        match self {
            Self::Cycle(cycle) | Self::CyclicRun { cycle, .. } => Some(cycle),
            _ => None,
        }
    }

    /// Returns the failed run recorded for a refused run, if any.
    pub fn failed_run(&self) -> Option<&WorkflowRun> {
        match self {
            Self::CyclicRun { run, .. } => Some(run),
            _ => None,
        }
    }
}

/// A cycle found in a workflow graph.
///
/// `cycle_path` starts and ends with the same node, and every consecutive
/// pair is an edge of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct CycleError {
    /// Human-readable description.
    pub message: String,
    /// Nodes along the cycle.
    pub cycle_path: Vec<NodeId>,
}

impl CycleError {
    /// Creates a cycle error from the closed path of the cycle.
    pub fn from_path(cycle_path: Vec<NodeId>) -> Self {
        let rendered = cycle_path
            .iter()
            .map(NodeId::as_str)
            .collect::<Vec<_>>()
            .join(" -> ");

        Self {
            message: format!("workflow contains a cycle: {rendered}"),
            cycle_path,
        }
    }

    /// Creates a cycle error for nodes that could never become ready.
    pub fn from_stuck(stuck: Vec<NodeId>) -> Self {
        let rendered = stuck
            .iter()
            .map(NodeId::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            message: format!("workflow contains a cycle among nodes: {rendered}"),
            cycle_path: stuck,
        }
    }
}

/// Failure of a single node.
///
/// Node errors are contained: they are recorded on the node and only affect
/// the run status in aggregate.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Inputs or configuration are unusable.
    #[error("{0}")]
    Validation(String),

    /// The remote operation failed.
    #[error("{}", .0.message_or_kind())]
    Remote(#[from] flowcraft_core::Error),

    /// The node did not finish in time.
    #[error("node timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The run was cancelled before the node finished.
    #[error("node execution cancelled")]
    Cancelled,

    /// A dependency failed and the run does not attempt dependents.
    #[error("upstream node {0} failed")]
    UpstreamFailed(NodeId),

    /// The node task ended abnormally.
    #[error("node task failed: {0}")]
    Internal(String),
}

impl NodeError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message() {
        let error = CycleError::from_path(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(error.to_string(), "workflow contains a cycle: a -> b -> a");

        let error: WorkflowError = error.into();
        assert!(matches!(error, WorkflowError::Cycle(_)));
        assert!(error.cycle().is_some());
        assert!(error.failed_run().is_none());
    }

    #[test]
    fn test_remote_error_message() {
        let error = NodeError::from(
            flowcraft_core::Error::external_error().with_message("No text response returned"),
        );
        assert_eq!(error.to_string(), "No text response returned");
        assert_eq!(
            NodeError::UpstreamFailed("crop-1".into()).to_string(),
            "upstream node crop-1 failed"
        );
    }
}
