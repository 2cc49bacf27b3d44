//! Run-owned execution state.

use std::collections::HashMap;

use crate::node::{NodeId, NodeResult, NodeStatus};

/// Node statuses and latest results.
///
/// The scheduler loop is the only writer while a run is in progress; node
/// tasks receive owned inputs resolved before they are spawned.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    statuses: HashMap<NodeId, NodeStatus>,
    results: HashMap<NodeId, NodeResult>,
}

impl RunContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a node's status; unknown nodes are idle.
    pub fn status(&self, node_id: &NodeId) -> NodeStatus {
        self.statuses.get(node_id).copied().unwrap_or_default()
    }

    /// Returns a node's latest result.
    pub fn result(&self, node_id: &NodeId) -> Option<&NodeResult> {
        self.results.get(node_id)
    }

    /// Returns all latest results.
    pub fn results(&self) -> &HashMap<NodeId, NodeResult> {
        &self.results
    }

    /// Returns all known statuses.
    pub fn statuses(&self) -> &HashMap<NodeId, NodeStatus> {
        &self.statuses
    }

    /// Resets the given nodes to idle. Their previous results are kept until
    /// overwritten.
    pub fn reset<'a>(&mut self, node_ids: impl IntoIterator<Item = &'a NodeId>) {
        for node_id in node_ids {
            self.statuses.insert(node_id.clone(), NodeStatus::Idle);
        }
    }

    /// Marks a node as running.
    pub fn mark_running(&mut self, node_id: &NodeId) {
        self.statuses.insert(node_id.clone(), NodeStatus::Running);
    }

    /// Stores a terminal result and the matching status.
    pub fn record(&mut self, result: NodeResult) {
        let status = if result.is_failure() {
            NodeStatus::Failed
        } else {
            NodeStatus::Success
        };
        self.statuses.insert(result.node_id.clone(), status);
        self.results.insert(result.node_id.clone(), result);
    }

    /// Drops all state of a node.
    pub fn forget(&mut self, node_id: &NodeId) {
        self.statuses.remove(node_id);
        self.results.remove(node_id);
    }
}
