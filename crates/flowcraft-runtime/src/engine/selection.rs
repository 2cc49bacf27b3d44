//! Run scope selection and graph projection.

use std::borrow::Cow;
use std::collections::HashSet;
use std::slice;

use tokio_util::sync::CancellationToken;

use crate::error::{WorkflowError, WorkflowResult};
use crate::graph::WorkflowGraph;
use crate::node::NodeId;
use crate::run::RunScope;

/// Which nodes a run executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSelection {
    /// The whole graph.
    Full,
    /// A subset of nodes; only edges between selected nodes are kept.
    Selected(Vec<NodeId>),
    /// A single node, with no edges.
    Single(NodeId),
}

impl RunSelection {
    /// Returns the scope recorded on the run.
    pub fn scope(&self) -> RunScope {
        match self {
            Self::Full => RunScope::Full,
            Self::Selected(_) => RunScope::Selected,
            Self::Single(_) => RunScope::Single,
        }
    }

    /// Returns the explicitly selected nodes.
    pub fn node_ids(&self) -> Option<Vec<NodeId>> {
        match self {
            Self::Full => None,
            Self::Selected(ids) => Some(ids.clone()),
            Self::Single(id) => Some(vec![id.clone()]),
        }
    }

    /// Projects the graph onto the selection.
    ///
    /// Fails when a selected node does not exist.
    pub fn project<'a>(&self, graph: &'a WorkflowGraph) -> WorkflowResult<Cow<'a, WorkflowGraph>> {
        let ids = match self {
            Self::Full => return Ok(Cow::Borrowed(graph)),
            Self::Selected(ids) => ids.as_slice(),
            Self::Single(id) => slice::from_ref(id),
        };

        if let Some(missing) = ids.iter().find(|id| !graph.contains_node(id)) {
            return Err(WorkflowError::NodeNotFound(missing.clone()));
        }

        let selected: HashSet<NodeId> = ids.iter().cloned().collect();
        Ok(Cow::Owned(graph.subgraph(&selected)))
    }
}

/// Parameters of a single run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Nodes to execute.
    pub selection: RunSelection,
    /// Owning workflow, forwarded to the run store.
    pub workflow_id: Option<String>,
    /// Cancels the run when triggered.
    pub cancellation: CancellationToken,
}

impl RunRequest {
    /// Creates a request for the given selection.
    pub fn new(selection: RunSelection) -> Self {
        Self {
            selection,
            workflow_id: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Runs every node.
    pub fn full() -> Self {
        Self::new(RunSelection::Full)
    }

    /// Runs the given nodes.
    pub fn selected<I>(node_ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<NodeId>,
    {
        Self::new(RunSelection::Selected(
            node_ids.into_iter().map(Into::into).collect(),
        ))
    }

    /// Runs one node.
    pub fn single(node_id: impl Into<NodeId>) -> Self {
        Self::new(RunSelection::Single(node_id.into()))
    }

    /// Sets the owning workflow.
    pub fn with_workflow_id(mut self, workflow_id: impl Into<String>) -> Self {
        self.workflow_id = Some(workflow_id.into());
        self
    }

    /// Uses the given cancellation token.
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }
}
