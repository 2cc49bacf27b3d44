//! Workflow graph definition and editing.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Edge, WorkflowDocument, dag};
use crate::error::{CycleError, WorkflowError, WorkflowResult};
use crate::node::{Node, NodeId, NodeKind, Position, decode_kind};

/// Tracing target for graph edits.
const TRACING_TARGET: &str = "flowcraft_runtime::graph";

/// A workflow graph: ordered nodes plus the edges between them.
///
/// Edits keep the structural invariants: node IDs are unique, every edge
/// connects two existing nodes, and no two edges connect the same handles
/// of the same nodes. Acyclicity is checked before execution rather than on
/// every edit, so an editor can pass through cyclic states.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WorkflowDocument")]
pub struct WorkflowGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl WorkflowGraph {
    /// Creates a new empty workflow graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from parts, enforcing the structural invariants.
    ///
    /// Duplicate connections are dropped; duplicate node IDs and edges with
    /// missing endpoints are rejected.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> WorkflowResult<Self> {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node)?;
        }
        for edge in edges {
            graph.connect(edge)?;
        }
        Ok(graph)
    }

    /// Returns the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns all nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns all edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns a node by ID.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id() == id)
    }

    /// Returns whether a node exists.
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Returns edges targeting a node, in edge order.
    pub fn incoming_edges<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| &e.target == id)
    }

    /// Returns edges originating from a node, in edge order.
    pub fn outgoing_edges<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| &e.source == id)
    }

    /// Adds a node, rejecting duplicate IDs.
    pub fn add_node(&mut self, node: Node) -> WorkflowResult<()> {
        if self.contains_node(node.id()) {
            return Err(WorkflowError::InvalidDefinition(format!(
                "duplicate node id {}",
                node.id()
            )));
        }

        tracing::trace!(
            target: TRACING_TARGET,
            node_id = %node.id(),
            node_type = %node.node_type(),
            "Node added"
        );

        self.nodes.push(node);
        Ok(())
    }

    /// Removes a node and every edge touching it.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        let index = self.nodes.iter().position(|node| node.id() == id)?;
        self.edges.retain(|e| &e.source != id && &e.target != id);
        Some(self.nodes.remove(index))
    }

    /// Connects two nodes.
    ///
    /// Returns `false` when an identical connection already exists, in which
    /// case the graph is unchanged.
    pub fn connect(&mut self, edge: Edge) -> WorkflowResult<bool> {
        for endpoint in [&edge.source, &edge.target] {
            if !self.contains_node(endpoint) {
                return Err(WorkflowError::InvalidDefinition(format!(
                    "edge {} references missing node {}",
                    edge.id, endpoint
                )));
            }
        }

        if self.edges.iter().any(|existing| existing.same_connection(&edge)) {
            tracing::debug!(
                target: TRACING_TARGET,
                source = %edge.source,
                target_node = %edge.target,
                "Ignoring duplicate connection"
            );
            return Ok(false);
        }

        self.edges.push(edge);
        Ok(true)
    }

    /// Removes an edge by ID.
    pub fn disconnect(&mut self, edge_id: &str) -> Option<Edge> {
        let index = self.edges.iter().position(|e| e.id == edge_id)?;
        Some(self.edges.remove(index))
    }

    /// Replaces a node's payload with one of the same type.
    pub fn update_node(&mut self, id: &NodeId, kind: impl Into<NodeKind>) -> WorkflowResult<()> {
        self.node_mut(id)?.replace_kind(kind.into())
    }

    /// Merges a partial JSON payload into a node's data.
    ///
    /// Fields absent from `patch` keep their value. The merged payload goes
    /// through the same decoding as imported documents, so percentages are
    /// clamped and unknown models fall back to the default.
    pub fn patch_node_data(&mut self, id: &NodeId, patch: serde_json::Value) -> WorkflowResult<()> {
        let serde_json::Value::Object(patch) = patch else {
            return Err(WorkflowError::InvalidDefinition(
                "node data patch must be a JSON object".into(),
            ));
        };

        let node = self.node_mut(id)?;
        let mut data = node.data_value()?;
        if let serde_json::Value::Object(fields) = &mut data {
            fields.extend(patch);
        }

        let kind = decode_kind(node.node_type(), data)?;
        node.replace_kind(kind)
    }

    /// Moves a node on the editor canvas.
    pub fn move_node(&mut self, id: &NodeId, x: f64, y: f64) -> WorkflowResult<()> {
        self.node_mut(id)?.set_position(Position { x, y });
        Ok(())
    }

    /// Checks that the graph is acyclic.
    pub fn validate(&self) -> Result<(), CycleError> {
        dag::validate_dag(&self.nodes, &self.edges)
    }

    /// Returns the nodes in a valid execution order.
    pub fn execution_order(&self) -> Result<Vec<&Node>, CycleError> {
        dag::execution_order(&self.nodes, &self.edges)
    }

    /// Returns nodes with no incoming edges.
    pub fn entry_nodes(&self) -> Vec<&Node> {
        dag::entry_nodes(&self.nodes, &self.edges)
    }

    /// Returns nodes with no outgoing edges.
    pub fn exit_nodes(&self) -> Vec<&Node> {
        dag::exit_nodes(&self.nodes, &self.edges)
    }

    /// Projects the graph onto a node subset.
    ///
    /// Keeps the selected nodes in their original order and only the edges
    /// whose endpoints are both selected.
    pub fn subgraph(&self, selected: &HashSet<NodeId>) -> Self {
        Self {
            nodes: self
                .nodes
                .iter()
                .filter(|node| selected.contains(node.id()))
                .cloned()
                .collect(),
            edges: self
                .edges
                .iter()
                .filter(|e| selected.contains(&e.source) && selected.contains(&e.target))
                .cloned()
                .collect(),
        }
    }

    fn node_mut(&mut self, id: &NodeId) -> WorkflowResult<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|node| node.id() == id)
            .ok_or_else(|| WorkflowError::NodeNotFound(id.clone()))
    }
}
