//! Workflow execution engine.
//!
//! The [`Engine`] validates the (projected) graph, then hands it to the
//! scheduler, which runs ready nodes concurrently through the
//! [`NodeExecutor`] and reports progress through a
//! [`RunReporter`](crate::run::RunReporter).

mod config;
mod context;
mod executor;
mod inputs;
mod scheduler;
mod selection;

use std::fmt;
use std::sync::Arc;

pub use config::{
    EngineConfig, EngineConfigBuilder, EngineConfigBuilderError, UpstreamFailurePolicy,
};
pub use context::RunContext;
pub use executor::{NodeExecutor, PreparedNode};
use scheduler::Scheduler;
pub use selection::{RunRequest, RunSelection};

use crate::error::{WorkflowError, WorkflowResult};
use crate::graph::WorkflowGraph;
use crate::node::Node;
use crate::run::{NoopObserver, RunId, RunObserver, RunReporter, RunStore, WorkflowRun};

/// Tracing target for engine operations.
const TRACING_TARGET: &str = "flowcraft_runtime::engine";

/// The workflow execution engine.
#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    executor: NodeExecutor,
    store: Option<Arc<dyn RunStore>>,
    observer: Arc<dyn RunObserver>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("has_store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Creates a new engine with the given configuration.
    pub fn new(config: EngineConfig, executor: NodeExecutor) -> Self {
        tracing::info!(
            target: TRACING_TARGET,
            max_concurrent_nodes = config.max_concurrent_nodes,
            node_timeout_ms = config.node_timeout.map(|t| t.as_millis() as u64),
            upstream_failure = %config.upstream_failure,
            "Workflow engine initialized"
        );

        Self {
            config,
            executor,
            store: None,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Creates a new engine with default configuration.
    pub fn with_defaults(executor: NodeExecutor) -> Self {
        Self::new(EngineConfig::default(), executor)
    }

    /// Persists runs to the given store.
    pub fn with_store(mut self, store: Arc<dyn RunStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sends live events to the given observer.
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the node executor.
    pub fn executor(&self) -> &NodeExecutor {
        &self.executor
    }

    /// Returns the run store, if any.
    pub fn store(&self) -> Option<&Arc<dyn RunStore>> {
        self.store.as_ref()
    }

    /// Executes the selected part of a workflow.
    ///
    /// In-scope nodes are reset to idle first; the statuses and results of
    /// other nodes in `context` are left untouched. A cycle aborts the run
    /// before any node executes: the run is reported as failed and returned
    /// inside [`WorkflowError::CyclicRun`]. Node failures never produce an
    /// error; they show up in the returned run's status and counters.
    pub async fn run(
        &self,
        graph: &WorkflowGraph,
        request: RunRequest,
        context: &mut RunContext,
    ) -> WorkflowResult<WorkflowRun> {
        let scoped = request.selection.project(graph)?;

        let run = WorkflowRun::new(
            RunId::generate(),
            request.selection.scope(),
            scoped.node_count(),
        )
        .with_workflow_id(request.workflow_id.clone())
        .with_selected_node_ids(request.selection.node_ids());
        let mut reporter = RunReporter::new(run, self.store.clone(), self.observer.clone());

        if let Err(cycle) = scoped.validate() {
            tracing::warn!(
                target: TRACING_TARGET,
                cycle = %cycle,
                "Refusing to run a cyclic workflow"
            );
            reporter.start().await;
            let run = reporter.finish(true).await;
            return Err(WorkflowError::CyclicRun {
                cycle,
                run: Box::new(run),
            });
        }

        context.reset(scoped.nodes().iter().map(Node::id));
        reporter.start().await;

        let scheduler = Scheduler::new(
            &scoped,
            &self.executor,
            &self.config,
            &request.cancellation,
        );
        let cancelled = scheduler.run(context, &mut reporter).await;

        Ok(reporter.finish(cancelled).await)
    }
}
