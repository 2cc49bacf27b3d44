//! Per-workflow editing and execution session.

use std::collections::VecDeque;

use crate::engine::{Engine, RunContext, RunRequest};
use crate::error::{WorkflowError, WorkflowResult};
use crate::graph::{WorkflowDocument, WorkflowGraph};
use crate::node::{NodeId, NodeResult, NodeStatus};
use crate::run::WorkflowRun;

/// Tracing target for session operations.
const TRACING_TARGET: &str = "flowcraft_runtime::session";

/// An open workflow: its graph, the latest node states and recent runs.
///
/// Node states persist across runs, so a selected or single-node run only
/// changes the nodes it covers. The history holds the newest runs first and
/// is capped at the engine's `history_limit`.
#[derive(Debug)]
pub struct WorkflowSession {
    engine: Engine,
    workflow_id: Option<String>,
    name: Option<String>,
    graph: WorkflowGraph,
    context: RunContext,
    history: VecDeque<WorkflowRun>,
}

impl WorkflowSession {
    /// Opens a session over an unsaved graph.
    pub fn new(engine: Engine, graph: WorkflowGraph) -> Self {
        Self {
            engine,
            workflow_id: None,
            name: None,
            graph,
            context: RunContext::new(),
            history: VecDeque::new(),
        }
    }

    /// Opens a session over a stored workflow, including its past runs.
    pub async fn load(engine: Engine, workflow_id: &str) -> WorkflowResult<Self> {
        let Some(store) = engine.store().cloned() else {
            return Err(WorkflowError::Internal(
                "engine has no run store to load workflows from".into(),
            ));
        };

        let stored = store.get_workflow(workflow_id).await?;
        let limit = engine.config().history_limit;

        tracing::info!(
            target: TRACING_TARGET,
            workflow_id,
            node_count = stored.content.node_count(),
            past_runs = stored.past_runs.len(),
            "Workflow loaded"
        );

        Ok(Self {
            engine,
            workflow_id: Some(stored.id),
            name: Some(stored.name),
            graph: stored.content,
            context: RunContext::new(),
            history: stored.past_runs.into_iter().take(limit).collect(),
        })
    }

    /// Sets the workflow identity used for persistence.
    pub fn with_workflow_id(mut self, workflow_id: impl Into<String>) -> Self {
        self.workflow_id = Some(workflow_id.into());
        self
    }

    /// Sets the workflow name used on export.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the workflow identifier, if known.
    pub fn workflow_id(&self) -> Option<&str> {
        self.workflow_id.as_deref()
    }

    /// Returns the graph.
    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    /// Returns the graph for editing.
    pub fn graph_mut(&mut self) -> &mut WorkflowGraph {
        &mut self.graph
    }

    /// Returns the latest status of a node.
    pub fn status(&self, node_id: &NodeId) -> NodeStatus {
        self.context.status(node_id)
    }

    /// Returns the latest result of a node.
    pub fn result(&self, node_id: &NodeId) -> Option<&NodeResult> {
        self.context.result(node_id)
    }

    /// Returns the run history, newest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &WorkflowRun> {
        self.history.iter()
    }

    /// Returns the most recent run.
    pub fn last_run(&self) -> Option<&WorkflowRun> {
        self.history.front()
    }

    /// Executes a run and records it in the history.
    ///
    /// Runs refused for a cycle are still recorded, using the failed run the
    /// engine reported.
    pub async fn run(&mut self, request: RunRequest) -> WorkflowResult<&WorkflowRun> {
        let request = match (&request.workflow_id, &self.workflow_id) {
            (None, Some(id)) => request.with_workflow_id(id.clone()),
            _ => request,
        };

        let run = match self.engine.run(&self.graph, request, &mut self.context).await {
            Ok(run) => run,
            Err(error) => {
                if let Some(run) = error.failed_run() {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        run_id = %run.run_id,
                        error = %error,
                        "Run refused"
                    );
                    self.remember(run.clone());
                }
                return Err(error);
            }
        };

        self.remember(run);
        self.history
            .front()
            .ok_or_else(|| WorkflowError::Internal("run history is empty".into()))
    }

    /// Runs every node.
    pub async fn run_full(&mut self) -> WorkflowResult<&WorkflowRun> {
        self.run(RunRequest::full()).await
    }

    /// Runs the given nodes.
    pub async fn run_selected(&mut self, node_ids: Vec<NodeId>) -> WorkflowResult<&WorkflowRun> {
        self.run(RunRequest::selected(node_ids)).await
    }

    /// Runs a single node.
    pub async fn run_single(&mut self, node_id: NodeId) -> WorkflowResult<&WorkflowRun> {
        self.run(RunRequest::single(node_id)).await
    }

    /// Exports the graph as a workflow document.
    pub fn export(&self) -> WorkflowDocument {
        WorkflowDocument::from_graph(self.name.clone(), &self.graph)
    }

    fn remember(&mut self, run: WorkflowRun) {
        self.history.push_front(run);
        self.history.truncate(self.engine.config().history_limit);
    }
}
