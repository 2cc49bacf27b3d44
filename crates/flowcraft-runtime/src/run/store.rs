//! Run persistence contract.

use flowcraft_core::Result;
use serde::{Deserialize, Serialize};

use super::{NodeExecutionResult, RunId, RunScope, RunStatus, WorkflowRun};
use crate::graph::WorkflowGraph;
use crate::node::NodeId;

/// Request to create a run record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRun {
    /// ID proposed by the engine; stores may assign their own.
    pub run_id: RunId,
    /// Owning workflow, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    /// Part of the workflow covered.
    pub scope: RunScope,
    /// Number of nodes in scope.
    pub node_count: usize,
    /// Nodes picked for a selected or single-node run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_node_ids: Option<Vec<NodeId>>,
}

/// A node status change within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecutionUpdate {
    /// Owning run.
    pub run_id: RunId,
    /// Node telemetry after the change.
    #[serde(flatten)]
    pub result: NodeExecutionResult,
}

/// Final status of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCompletion {
    /// Run being completed.
    pub run_id: RunId,
    /// Final status.
    pub status: RunStatus,
}

/// A persisted workflow with its recent runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredWorkflow {
    /// Workflow identifier.
    pub id: String,
    /// Workflow name.
    pub name: String,
    /// Graph content.
    pub content: WorkflowGraph,
    /// Recent runs, newest first.
    #[serde(default)]
    pub past_runs: Vec<WorkflowRun>,
}

/// Durable storage for workflows and their runs.
///
/// The engine treats every call as best effort: failures are logged and
/// never abort a run.
#[async_trait::async_trait]
pub trait RunStore: Send + Sync {
    /// Creates a run record and returns the ID to use for it.
    async fn create_run(&self, run: &NewRun) -> Result<RunId>;

    /// Records a node status change.
    async fn update_node_execution(&self, update: &NodeExecutionUpdate) -> Result<()>;

    /// Marks a run as finished.
    async fn complete_run(&self, completion: &RunCompletion) -> Result<()>;

    /// Loads a workflow with its recent runs.
    async fn get_workflow(&self, workflow_id: &str) -> Result<StoredWorkflow>;
}
