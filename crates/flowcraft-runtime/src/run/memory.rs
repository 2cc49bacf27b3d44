//! In-process run store.

use std::cmp::Ordering;
use std::collections::HashMap;

use flowcraft_core::{Error, Result};
use jiff::Timestamp;
use tokio::sync::RwLock;

use super::{
    NewRun, NodeExecutionUpdate, RunCompletion, RunId, RunStore, StoredWorkflow, WorkflowRun,
};
use crate::graph::WorkflowGraph;

/// Default number of past runs returned per workflow.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug)]
struct WorkflowEntry {
    name: String,
    content: WorkflowGraph,
}

/// Run store kept in memory.
///
/// Counters are recomputed from the node entries on every update, so they
/// stay consistent however updates arrive. Each workflow keeps at most
/// `history_limit` runs; older ones are dropped when a new run is created.
#[derive(Debug)]
pub struct MemoryRunStore {
    workflows: RwLock<HashMap<String, WorkflowEntry>>,
    runs: RwLock<HashMap<RunId, WorkflowRun>>,
    history_limit: usize,
}

impl Default for MemoryRunStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl MemoryRunStore {
    /// Creates a store returning at most `history_limit` past runs per workflow.
    pub fn new(history_limit: usize) -> Self {
        Self {
            workflows: RwLock::default(),
            runs: RwLock::default(),
            history_limit,
        }
    }

    /// Saves or replaces a workflow.
    pub async fn save_workflow(
        &self,
        workflow_id: impl Into<String>,
        name: impl Into<String>,
        content: WorkflowGraph,
    ) {
        let entry = WorkflowEntry {
            name: name.into(),
            content,
        };
        self.workflows.write().await.insert(workflow_id.into(), entry);
    }

    /// Returns a run by ID.
    pub async fn run(&self, run_id: &RunId) -> Option<WorkflowRun> {
        self.runs.read().await.get(run_id).cloned()
    }

    /// Returns the runs of a workflow, newest first, capped at the history limit.
    pub async fn runs_for(&self, workflow_id: &str) -> Vec<WorkflowRun> {
        let runs = self.runs.read().await;
        let mut past: Vec<WorkflowRun> = runs
            .values()
            .filter(|run| run.workflow_id.as_deref() == Some(workflow_id))
            .cloned()
            .collect();
        past.sort_by(newest_first);
        past.truncate(self.history_limit);
        past
    }

    /// Returns the number of runs held, across all workflows.
    pub async fn run_count(&self) -> usize {
        self.runs.read().await.len()
    }

    /// Drops the oldest runs of a workflow beyond the history limit.
    fn prune(&self, runs: &mut HashMap<RunId, WorkflowRun>, workflow_id: Option<&str>) {
        let mut owned: Vec<(&RunId, &WorkflowRun)> = runs
            .iter()
            .filter(|(_, run)| run.workflow_id.as_deref() == workflow_id)
            .collect();
        let keep = self.history_limit.max(1);
        if owned.len() <= keep {
            return;
        }

        owned.sort_by(|(_, a), (_, b)| newest_first(a, b));
        let stale: Vec<RunId> = owned[keep..].iter().map(|(id, _)| (*id).clone()).collect();
        for run_id in &stale {
            runs.remove(run_id);
        }
    }

    fn missing_run(run_id: &RunId) -> Error {
        Error::not_found().with_message(format!("run {run_id} not found"))
    }
}

fn newest_first(a: &WorkflowRun, b: &WorkflowRun) -> Ordering {
    b.started_at
        .cmp(&a.started_at)
        .then_with(|| b.run_id.cmp(&a.run_id))
}

#[async_trait::async_trait]
impl RunStore for MemoryRunStore {
    async fn create_run(&self, run: &NewRun) -> Result<RunId> {
        let record = WorkflowRun::new(run.run_id.clone(), run.scope, run.node_count)
            .with_workflow_id(run.workflow_id.clone())
            .with_selected_node_ids(run.selected_node_ids.clone());

        let mut runs = self.runs.write().await;
        runs.insert(run.run_id.clone(), record);
        self.prune(&mut runs, run.workflow_id.as_deref());
        Ok(run.run_id.clone())
    }

    async fn update_node_execution(&self, update: &NodeExecutionUpdate) -> Result<()> {
        let mut runs = self.runs.write().await;
        let run = runs
            .get_mut(&update.run_id)
            .ok_or_else(|| Self::missing_run(&update.run_id))?;
        run.upsert_node_result(update.result.clone());
        Ok(())
    }

    async fn complete_run(&self, completion: &RunCompletion) -> Result<()> {
        let mut runs = self.runs.write().await;
        let run = runs
            .get_mut(&completion.run_id)
            .ok_or_else(|| Self::missing_run(&completion.run_id))?;
        run.complete(completion.status, Timestamp::now());
        Ok(())
    }

    async fn get_workflow(&self, workflow_id: &str) -> Result<StoredWorkflow> {
        let (name, content) = {
            let workflows = self.workflows.read().await;
            let entry = workflows.get(workflow_id).ok_or_else(|| {
                Error::not_found().with_message(format!("workflow {workflow_id} not found"))
            })?;
            (entry.name.clone(), entry.content.clone())
        };

        Ok(StoredWorkflow {
            id: workflow_id.to_owned(),
            name,
            content,
            past_runs: self.runs_for(workflow_id).await,
        })
    }
}

#[cfg(test)]
mod tests {
    use flowcraft_core::ErrorKind;

    use super::*;
    use crate::node::{NodeStatus, NodeType};
    use crate::run::{NodeExecutionResult, RunScope, RunStatus};

    fn update(run_id: &RunId, node: &str, status: NodeStatus) -> NodeExecutionUpdate {
        NodeExecutionUpdate {
            run_id: run_id.clone(),
            result: NodeExecutionResult {
                node_id: node.into(),
                node_type: NodeType::Llm,
                node_name: "LLM".into(),
                status,
                started_at: None,
                completed_at: None,
                duration_ms: None,
                output: None,
                error: None,
            },
        }
    }

    #[tokio::test]
    async fn test_counters_follow_updates() {
        let store = MemoryRunStore::default();
        let run_id = store
            .create_run(&NewRun {
                run_id: "r1".into(),
                workflow_id: Some("wf".into()),
                scope: RunScope::Full,
                node_count: 2,
                selected_node_ids: None,
            })
            .await
            .unwrap();

        store.update_node_execution(&update(&run_id, "a", NodeStatus::Running)).await.unwrap();
        store.update_node_execution(&update(&run_id, "a", NodeStatus::Success)).await.unwrap();
        store.update_node_execution(&update(&run_id, "b", NodeStatus::Failed)).await.unwrap();
        store
            .complete_run(&RunCompletion {
                run_id: run_id.clone(),
                status: RunStatus::Partial,
            })
            .await
            .unwrap();

        let run = store.run(&run_id).await.unwrap();
        assert_eq!(run.successful_nodes, 1);
        assert_eq!(run.failed_nodes, 1);
        assert_eq!(run.status, RunStatus::Partial);
        assert!(run.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_history_is_capped_newest_first() {
        let store = MemoryRunStore::new(3);
        store.save_workflow("wf", "Demo", WorkflowGraph::new()).await;

        for i in 0..5 {
            store
                .create_run(&NewRun {
                    run_id: format!("r{i}").as_str().into(),
                    workflow_id: Some("wf".into()),
                    scope: RunScope::Full,
                    node_count: 0,
                    selected_node_ids: None,
                })
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let workflow = store.get_workflow("wf").await.unwrap();
        let ids: Vec<&str> = workflow.past_runs.iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(ids, vec!["r4", "r3", "r2"]);
    }

    #[tokio::test]
    async fn test_old_runs_are_dropped_per_workflow() {
        let store = MemoryRunStore::new(2);

        for (i, workflow_id) in ["a", "b", "a", "a", "b", "a"].into_iter().enumerate() {
            store
                .create_run(&NewRun {
                    run_id: format!("r{i}").as_str().into(),
                    workflow_id: Some(workflow_id.into()),
                    scope: RunScope::Full,
                    node_count: 0,
                    selected_node_ids: None,
                })
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        assert_eq!(store.run_count().await, 4);
        assert!(store.run(&"r0".into()).await.is_none());
        assert!(store.run(&"r2".into()).await.is_none());
        assert!(store.run(&"r1".into()).await.is_some());
        assert!(store.run(&"r5".into()).await.is_some());

        let ids: Vec<String> = store
            .runs_for("a")
            .await
            .into_iter()
            .map(|run| run.run_id.to_string())
            .collect();
        assert_eq!(ids, vec!["r5", "r3"]);
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let store = MemoryRunStore::default();
        let error = store.get_workflow("nope").await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert!(
            store
                .update_node_execution(&update(&"ghost".into(), "a", NodeStatus::Running))
                .await
                .is_err()
        );
    }
}
