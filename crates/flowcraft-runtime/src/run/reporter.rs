//! Run telemetry reporting.

use std::sync::Arc;

use jiff::Timestamp;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::record::millis_between;
use super::{
    ExecutionEvent, NewRun, NodeExecutionResult, NodeExecutionUpdate, RunCompletion,
    RunObserver, RunStatus, RunStore, WorkflowRun,
};
use crate::node::{Node, NodeResult, NodeStatus};

/// Tracing target for run reporting.
const TRACING_TARGET: &str = "flowcraft_runtime::run";

/// Background writer for node updates.
///
/// Updates are written one at a time in the order they were queued, so the
/// caller never waits on the store.
struct Persister {
    updates: mpsc::UnboundedSender<NodeExecutionUpdate>,
    task: JoinHandle<()>,
}

impl Persister {
    fn spawn(store: Arc<dyn RunStore>) -> Self {
        let (updates, mut receiver) = mpsc::unbounded_channel::<NodeExecutionUpdate>();

        let task = tokio::spawn(async move {
            while let Some(update) = receiver.recv().await {
                if let Err(error) = store.update_node_execution(&update).await {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        run_id = %update.run_id,
                        node_id = %update.result.node_id,
                        error = %error,
                        "Failed to persist node update"
                    );
                }
            }
        });

        Self { updates, task }
    }

    /// Waits until every queued update has been written.
    async fn drain(self) {
        drop(self.updates);
        if let Err(error) = self.task.await {
            tracing::error!(
                target: TRACING_TARGET,
                error = %error,
                "Node update writer stopped abnormally"
            );
        }
    }
}

/// Builds the run record and forwards every change to the store and the
/// observer.
///
/// Only [`start`](Self::start) and [`finish`](Self::finish) wait on the
/// store. Node transitions are queued to a background writer and flushed
/// before the run is completed. Store failures are logged and otherwise
/// ignored.
pub struct RunReporter {
    run: WorkflowRun,
    store: Option<Arc<dyn RunStore>>,
    observer: Arc<dyn RunObserver>,
    persister: Option<Persister>,
}

impl RunReporter {
    /// Creates a reporter for a fresh run record.
    pub fn new(
        run: WorkflowRun,
        store: Option<Arc<dyn RunStore>>,
        observer: Arc<dyn RunObserver>,
    ) -> Self {
        Self {
            run,
            store,
            observer,
            persister: None,
        }
    }

    /// Returns the record built so far.
    pub fn run(&self) -> &WorkflowRun {
        &self.run
    }

    /// Persists the new run and announces it.
    ///
    /// When the store assigns its own run ID, that ID is adopted.
    pub async fn start(&mut self) {
        if let Some(store) = &self.store {
            let new_run = NewRun {
                run_id: self.run.run_id.clone(),
                workflow_id: self.run.workflow_id.clone(),
                scope: self.run.scope,
                node_count: self.run.total_nodes,
                selected_node_ids: self.run.selected_node_ids.clone(),
            };

            match store.create_run(&new_run).await {
                Ok(run_id) => self.run.run_id = run_id,
                Err(error) => tracing::warn!(
                    target: TRACING_TARGET,
                    run_id = %self.run.run_id,
                    error = %error,
                    "Failed to persist run start"
                ),
            }

            self.persister = Some(Persister::spawn(store.clone()));
        }

        tracing::info!(
            target: TRACING_TARGET,
            run_id = %self.run.run_id,
            scope = %self.run.scope,
            total_nodes = self.run.total_nodes,
            "Workflow run started"
        );

        self.observer.notify(&ExecutionEvent::RunStarted {
            run: self.run.clone(),
        });
    }

    /// Records that a node started.
    pub fn node_started(&mut self, node: &Node) {
        let entry = NodeExecutionResult {
            node_id: node.id().clone(),
            node_type: node.node_type(),
            node_name: node.label().to_owned(),
            status: NodeStatus::Running,
            started_at: Some(Timestamp::now()),
            completed_at: None,
            duration_ms: None,
            output: None,
            error: None,
        };

        self.observer.notify(&ExecutionEvent::NodeStarted {
            run_id: self.run.run_id.clone(),
            node_id: node.id().clone(),
        });
        self.record(entry);
    }

    /// Records a node's terminal result.
    pub fn node_finished(&mut self, node: &Node, result: &NodeResult) {
        let started_at = self
            .run
            .node_result(node.id())
            .and_then(|entry| entry.started_at)
            .unwrap_or(result.timestamp);

        let entry = NodeExecutionResult {
            node_id: node.id().clone(),
            node_type: node.node_type(),
            node_name: node.label().to_owned(),
            status: if result.is_failure() {
                NodeStatus::Failed
            } else {
                NodeStatus::Success
            },
            started_at: Some(started_at),
            completed_at: Some(result.timestamp),
            duration_ms: Some(millis_between(started_at, result.timestamp)),
            output: result.output.as_value().map(str::to_owned),
            error: result.error.clone(),
        };

        self.observer.notify(&ExecutionEvent::NodeFinished {
            run_id: self.run.run_id.clone(),
            result: entry.clone(),
        });
        self.record(entry);
    }

    /// Completes the run.
    ///
    /// Pending node updates are flushed first. The status is derived from
    /// the node counts unless `aborted`, in which case the run is failed.
    pub async fn finish(mut self, aborted: bool) -> WorkflowRun {
        if let Some(persister) = self.persister.take() {
            persister.drain().await;
        }

        self.run.recount();
        let status = if aborted {
            RunStatus::Failed
        } else {
            RunStatus::from_counts(self.run.successful_nodes, self.run.failed_nodes)
        };
        self.run.complete(status, Timestamp::now());

        if let Some(store) = &self.store {
            let completion = RunCompletion {
                run_id: self.run.run_id.clone(),
                status,
            };
            if let Err(error) = store.complete_run(&completion).await {
                tracing::warn!(
                    target: TRACING_TARGET,
                    run_id = %self.run.run_id,
                    error = %error,
                    "Failed to persist run completion"
                );
            }
        }

        tracing::info!(
            target: TRACING_TARGET,
            run_id = %self.run.run_id,
            status = %status,
            successful_nodes = self.run.successful_nodes,
            failed_nodes = self.run.failed_nodes,
            duration_ms = self.run.duration_ms.unwrap_or_default(),
            "Workflow run completed"
        );

        self.observer.notify(&ExecutionEvent::RunCompleted {
            run: self.run.clone(),
        });
        self.run
    }

    fn record(&mut self, entry: NodeExecutionResult) {
        if let Some(persister) = &self.persister {
            let update = NodeExecutionUpdate {
                run_id: self.run.run_id.clone(),
                result: entry.clone(),
            };
            if persister.updates.send(update).is_err() {
                tracing::warn!(
                    target: TRACING_TARGET,
                    run_id = %self.run.run_id,
                    node_id = %entry.node_id,
                    "Node update writer is gone"
                );
            }
        }

        self.run.upsert_node_result(entry);
    }
}

#[cfg(test)]
mod tests {
    use flowcraft_core::{Error, Result};
    use tokio::sync::mpsc;

    use super::*;
    use crate::graph::WorkflowGraph;
    use crate::node::{NodeOutput, TextData};
    use crate::run::{MemoryRunStore, NoopObserver, RunId, RunScope, StoredWorkflow};

    /// Store whose every call fails.
    struct BrokenStore;

    #[async_trait::async_trait]
    impl RunStore for BrokenStore {
        async fn create_run(&self, _run: &NewRun) -> Result<RunId> {
            Err(Error::network_error())
        }

        async fn update_node_execution(&self, _update: &NodeExecutionUpdate) -> Result<()> {
            Err(Error::network_error())
        }

        async fn complete_run(&self, _completion: &RunCompletion) -> Result<()> {
            Err(Error::network_error())
        }

        async fn get_workflow(&self, _workflow_id: &str) -> Result<StoredWorkflow> {
            Ok(StoredWorkflow {
                id: String::new(),
                name: String::new(),
                content: WorkflowGraph::new(),
                past_runs: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_store_failures_are_not_fatal() {
        let run = WorkflowRun::new("r1".into(), RunScope::Full, 1);
        let mut reporter =
            RunReporter::new(run, Some(Arc::new(BrokenStore)), Arc::new(NoopObserver));
        let node = Node::new("a", TextData::new("x"));

        reporter.start().await;
        reporter.node_started(&node);
        reporter.node_finished(
            &node,
            &NodeResult::success("a".into(), NodeOutput::Text("x".into())),
        );
        let run = reporter.finish(false).await;

        assert_eq!(run.run_id.as_str(), "r1");
        assert_eq!(run.status, RunStatus::Success);
        assert_eq!(run.node_results[0].output.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_events_and_store_agree() {
        let store = Arc::new(MemoryRunStore::default());
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let run = WorkflowRun::new("r2".into(), RunScope::Full, 2);
        let mut reporter = RunReporter::new(run, Some(store.clone()), Arc::new(sender));

        let a = Node::new("a", TextData::new("x"));
        let b = Node::new("b", TextData::new("y"));

        reporter.start().await;
        reporter.node_started(&a);
        reporter.node_finished(&a, &NodeResult::success("a".into(), NodeOutput::Text("x".into())));
        reporter.node_finished(&b, &NodeResult::failure("b".into(), "boom"));
        let run = reporter.finish(false).await;

        assert_eq!(run.status, RunStatus::Partial);
        let stored = store.run(&run.run_id).await.unwrap();
        assert_eq!(stored.status, RunStatus::Partial);
        assert_eq!((stored.successful_nodes, stored.failed_nodes), (1, 1));

        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], ExecutionEvent::RunStarted { .. }));
        assert!(matches!(events[4], ExecutionEvent::RunCompleted { .. }));
    }
}
