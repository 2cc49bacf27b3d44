//! Readiness-driven concurrent scheduling.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use petgraph::stable_graph::NodeIndex;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tokio_util::sync::CancellationToken;

use super::{EngineConfig, NodeExecutor, PreparedNode, RunContext, UpstreamFailurePolicy};
use crate::error::NodeError;
use crate::graph::WorkflowGraph;
use crate::graph::dag::DependencyGraph;
use crate::node::{Node, NodeId, NodeOutput, NodeResult, NodeStatus};
use crate::run::RunReporter;

/// Tracing target for scheduling.
const TRACING_TARGET: &str = "flowcraft_runtime::engine::scheduler";

type NodeOutcome = Result<NodeOutput, NodeError>;

/// Remaining dependency counts and the queue of nodes ready to start.
struct Frontier<'a> {
    dag: DependencyGraph<'a>,
    remaining: HashMap<NodeIndex, usize>,
    ready: VecDeque<&'a Node>,
}

impl<'a> Frontier<'a> {
    fn new(graph: &'a WorkflowGraph) -> Self {
        let dag = DependencyGraph::build(graph.nodes(), graph.edges());

        let remaining: HashMap<NodeIndex, usize> = dag
            .node_indices()
            .map(|index| (index, dag.in_degree(index)))
            .collect();

        let ready = dag
            .node_indices()
            .filter(|index| remaining[index] == 0)
            .map(|index| dag.node(index))
            .collect();

        Self {
            dag,
            remaining,
            ready,
        }
    }

    /// Releases the dependents of a finished node, one count per edge.
    fn release(&mut self, finished: &NodeId) {
        let Some(index) = self.dag.index(finished) else {
            return;
        };

        for next in self.dag.dependents(index) {
            let Some(count) = self.remaining.get_mut(&next) else {
                continue;
            };
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.ready.push_back(self.dag.node(next));
            }
        }
    }
}

/// Executes every node of a (projected) graph.
///
/// Ready nodes are spawned onto a [`JoinSet`] as soon as their last
/// dependency finishes; completions are handled one at a time by the loop,
/// which is the only writer of the [`RunContext`].
pub(crate) struct Scheduler<'a> {
    graph: &'a WorkflowGraph,
    executor: &'a NodeExecutor,
    config: &'a EngineConfig,
    cancellation: &'a CancellationToken,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        graph: &'a WorkflowGraph,
        executor: &'a NodeExecutor,
        config: &'a EngineConfig,
        cancellation: &'a CancellationToken,
    ) -> Self {
        Self {
            graph,
            executor,
            config,
            cancellation,
        }
    }

    /// Runs until no node is running and none is ready.
    ///
    /// Returns whether the run was cancelled.
    pub async fn run(&self, context: &mut RunContext, reporter: &mut RunReporter) -> bool {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_nodes));
        let mut frontier = Frontier::new(self.graph);
        let mut tasks: JoinSet<NodeOutcome> = JoinSet::new();
        let mut running: HashMap<Id, (&'a Node, Instant)> = HashMap::new();

        loop {
            while let Some(node) = frontier.ready.pop_front() {
                if let Some(error) = self.precheck(node, context) {
                    self.finish(node, Err(error), context, reporter, &mut frontier);
                    continue;
                }

                context.mark_running(node.id());
                reporter.node_started(node);

                match self.executor.prepare(node, self.graph, context.results()) {
                    Ok(prepared) => {
                        let handle = tasks.spawn(self.node_task(prepared, semaphore.clone()));
                        running.insert(handle.id(), (node, Instant::now()));
                    }
                    Err(error) => {
                        self.finish(node, Err(error), context, reporter, &mut frontier);
                    }
                }
            }

            let Some(joined) = tasks.join_next_with_id().await else {
                break;
            };

            let (task_id, outcome) = match joined {
                Ok((task_id, outcome)) => (task_id, outcome),
                Err(error) => {
                    let reason = if error.is_panic() {
                        "node task panicked"
                    } else {
                        "node task was aborted"
                    };
                    (error.id(), Err(NodeError::Internal(reason.to_owned())))
                }
            };

            let Some((node, started)) = running.remove(&task_id) else {
                tracing::error!(target: TRACING_TARGET, task_id = %task_id, "Unknown node task");
                continue;
            };

            tracing::debug!(
                target: TRACING_TARGET,
                node_id = %node.id(),
                success = outcome.is_ok(),
                elapsed_ms = started.elapsed().as_millis(),
                "Node task finished"
            );

            self.finish(node, outcome, context, reporter, &mut frontier);
        }

        let unfinished = self
            .graph
            .nodes()
            .iter()
            .filter(|node| !context.status(node.id()).is_terminal())
            .count();
        if unfinished > 0 {
            tracing::error!(
                target: TRACING_TARGET,
                unfinished,
                "Scheduler drained with unfinished nodes"
            );
        }

        self.cancellation.is_cancelled()
    }

    /// Returns an error when the node must fail without running.
    fn precheck(&self, node: &Node, context: &RunContext) -> Option<NodeError> {
        if self.cancellation.is_cancelled() {
            return Some(NodeError::Cancelled);
        }

        if self.config.upstream_failure == UpstreamFailurePolicy::Fail {
            return self
                .graph
                .incoming_edges(node.id())
                .find(|edge| context.status(&edge.source) == NodeStatus::Failed)
                .map(|edge| NodeError::UpstreamFailed(edge.source.clone()));
        }

        None
    }

    /// Records a terminal outcome and releases the node's dependents.
    fn finish(
        &self,
        node: &'a Node,
        outcome: NodeOutcome,
        context: &mut RunContext,
        reporter: &mut RunReporter,
        frontier: &mut Frontier<'a>,
    ) {
        let result = match outcome {
            Ok(output) => NodeResult::success(node.id().clone(), output),
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    run_id = %reporter.run().run_id,
                    node_id = %node.id(),
                    node_type = %node.node_type(),
                    error = %error,
                    "Node failed"
                );
                NodeResult::failure(node.id().clone(), error.to_string())
            }
        };

        reporter.node_finished(node, &result);
        context.record(result);
        frontier.release(node.id());
    }

    /// Builds the task future for a prepared node.
    ///
    /// The node waits for a concurrency permit, then runs under the optional
    /// timeout; cancellation interrupts both.
    fn node_task(
        &self,
        prepared: PreparedNode,
        semaphore: Arc<Semaphore>,
    ) -> impl Future<Output = NodeOutcome> + Send + use<> {
        let executor = self.executor.clone();
        let cancellation = self.cancellation.clone();
        let timeout = self.config.node_timeout;

        async move {
            let work = async {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|error| NodeError::Internal(error.to_string()))?;

                match timeout {
                    Some(limit) => tokio::time::timeout(limit, executor.run(prepared))
                        .await
                        .unwrap_or(Err(NodeError::Timeout(limit))),
                    None => executor.run(prepared).await,
                }
            };

            tokio::select! {
                _ = cancellation.cancelled() => Err(NodeError::Cancelled),
                outcome = work => outcome,
            }
        }
    }
}
