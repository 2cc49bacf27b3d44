//! Run and node execution records.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::RunId;
use crate::node::{NodeId, NodeStatus, NodeType};

/// Which part of the workflow a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunScope {
    /// Every node.
    Full,
    /// A user-selected subset.
    Selected,
    /// One node.
    Single,
}

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    /// Still executing.
    Running,
    /// Every node succeeded.
    Success,
    /// Every node failed, or the run was aborted.
    Failed,
    /// At least one node succeeded and at least one failed.
    Partial,
}

impl RunStatus {
    /// Derives the final status from node outcome counts.
    ///
    /// A run without nodes succeeds.
    pub const fn from_counts(successful: usize, failed: usize) -> Self {
        match (successful, failed) {
            (_, 0) => Self::Success,
            (0, _) => Self::Failed,
            _ => Self::Partial,
        }
    }

    /// Returns whether the run has finished.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Telemetry for one node within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecutionResult {
    /// Node the entry belongs to.
    pub node_id: NodeId,
    /// Node type.
    pub node_type: NodeType,
    /// Node label at execution time.
    pub node_name: String,
    /// Current status.
    pub status: NodeStatus,
    /// When the node started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    /// When the node finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    /// Execution time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Output value on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Record of a single workflow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    /// Run identifier.
    pub run_id: RunId,
    /// Workflow the run belongs to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    /// Part of the workflow covered.
    pub scope: RunScope,
    /// Overall status.
    pub status: RunStatus,
    /// When the run started.
    pub started_at: Timestamp,
    /// When the run finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    /// Total run time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Per-node telemetry, in start order.
    #[serde(default)]
    pub node_results: Vec<NodeExecutionResult>,
    /// Number of nodes in scope.
    pub total_nodes: usize,
    /// Nodes that succeeded.
    pub successful_nodes: usize,
    /// Nodes that failed.
    pub failed_nodes: usize,
    /// Nodes picked for a selected or single-node run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_node_ids: Option<Vec<NodeId>>,
}

impl WorkflowRun {
    /// Creates a running record.
    pub fn new(run_id: RunId, scope: RunScope, total_nodes: usize) -> Self {
        Self {
            run_id,
            workflow_id: None,
            scope,
            status: RunStatus::Running,
            started_at: Timestamp::now(),
            completed_at: None,
            duration_ms: None,
            node_results: Vec::new(),
            total_nodes,
            successful_nodes: 0,
            failed_nodes: 0,
            selected_node_ids: None,
        }
    }

    /// Sets the owning workflow.
    pub fn with_workflow_id(mut self, workflow_id: Option<String>) -> Self {
        self.workflow_id = workflow_id;
        self
    }

    /// Sets the selected node IDs.
    pub fn with_selected_node_ids(mut self, ids: Option<Vec<NodeId>>) -> Self {
        self.selected_node_ids = ids;
        self
    }

    /// Returns the entry for a node.
    pub fn node_result(&self, node_id: &NodeId) -> Option<&NodeExecutionResult> {
        self.node_results.iter().find(|r| &r.node_id == node_id)
    }

    /// Inserts or replaces a node entry and recomputes the counters.
    pub fn upsert_node_result(&mut self, result: NodeExecutionResult) {
        match self
            .node_results
            .iter_mut()
            .find(|r| r.node_id == result.node_id)
        {
            Some(existing) => *existing = result,
            None => self.node_results.push(result),
        }
        self.recount();
    }

    /// Recomputes the success and failure counters from the node entries.
    pub fn recount(&mut self) {
        self.successful_nodes = self.count(NodeStatus::Success);
        self.failed_nodes = self.count(NodeStatus::Failed);
    }

    /// Stamps completion with the given final status.
    pub fn complete(&mut self, status: RunStatus, completed_at: Timestamp) {
        self.recount();
        self.status = status;
        self.completed_at = Some(completed_at);
        self.duration_ms = Some(millis_between(self.started_at, completed_at));
    }

    fn count(&self, status: NodeStatus) -> usize {
        self.node_results
            .iter()
            .filter(|r| r.status == status)
            .count()
    }
}

/// Milliseconds from `start` to `end`, saturating at zero.
pub(crate) fn millis_between(start: Timestamp, end: Timestamp) -> u64 {
    u64::try_from(end.duration_since(start).as_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, status: NodeStatus) -> NodeExecutionResult {
        NodeExecutionResult {
            node_id: id.into(),
            node_type: NodeType::Text,
            node_name: "Text".into(),
            status,
            started_at: None,
            completed_at: None,
            duration_ms: None,
            output: None,
            error: None,
        }
    }

    #[test]
    fn test_status_from_counts() {
        assert_eq!(RunStatus::from_counts(0, 0), RunStatus::Success);
        assert_eq!(RunStatus::from_counts(3, 0), RunStatus::Success);
        assert_eq!(RunStatus::from_counts(0, 2), RunStatus::Failed);
        assert_eq!(RunStatus::from_counts(1, 1), RunStatus::Partial);
    }

    #[test]
    fn test_upsert_recounts() {
        let mut run = WorkflowRun::new(RunId::generate(), RunScope::Full, 2);
        run.upsert_node_result(entry("a", NodeStatus::Running));
        run.upsert_node_result(entry("b", NodeStatus::Failed));
        assert_eq!((run.successful_nodes, run.failed_nodes), (0, 1));

        run.upsert_node_result(entry("a", NodeStatus::Success));
        assert_eq!(run.node_results.len(), 2);
        assert_eq!((run.successful_nodes, run.failed_nodes), (1, 1));
    }

    #[test]
    fn test_run_json_shape() {
        let run = WorkflowRun::new("run-1".into(), RunScope::Selected, 1)
            .with_selected_node_ids(Some(vec!["a".into()]));
        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["runId"], "run-1");
        assert_eq!(json["scope"], "selected");
        assert_eq!(json["status"], "running");
        assert_eq!(json["selectedNodeIds"][0], "a");
    }
}
