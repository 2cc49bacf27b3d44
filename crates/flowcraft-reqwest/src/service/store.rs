//! Run persistence against the workflow API.

use flowcraft_core::Result;
use flowcraft_runtime::run::{
    NewRun, NodeExecutionUpdate, RunCompletion, RunId, RunStore, StoredWorkflow,
};
use serde::Deserialize;

use crate::connect::ReqwestClient;

/// Creates a run record.
pub const CREATE_RUN_PATH: &str = "api/workflow/create-run";
/// Records a node status change.
pub const UPDATE_NODE_PATH: &str = "api/workflow/update-node";
/// Completes a run.
pub const COMPLETE_RUN_PATH: &str = "api/workflow/complete-run";
/// Workflow collection; a workflow is addressed by appending its ID.
pub const WORKFLOWS_PATH: &str = "api/workflows/";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedRun {
    run_id: RunId,
}

#[async_trait::async_trait]
impl RunStore for ReqwestClient {
    async fn create_run(&self, run: &NewRun) -> Result<RunId> {
        let url = self.endpoint(CREATE_RUN_PATH)?;
        let created: CreatedRun = self.post_json(url, run).await?;
        Ok(created.run_id)
    }

    async fn update_node_execution(&self, update: &NodeExecutionUpdate) -> Result<()> {
        let url = self.endpoint(UPDATE_NODE_PATH)?;
        let _: serde_json::Value = self.post_json(url, update).await?;
        Ok(())
    }

    async fn complete_run(&self, completion: &RunCompletion) -> Result<()> {
        let url = self.endpoint(COMPLETE_RUN_PATH)?;
        let _: serde_json::Value = self.post_json(url, completion).await?;
        Ok(())
    }

    async fn get_workflow(&self, workflow_id: &str) -> Result<StoredWorkflow> {
        let url = self.endpoint_with_segment(WORKFLOWS_PATH, workflow_id)?;
        Ok(self.get_json(url).await?)
    }
}

#[cfg(test)]
mod tests {
    use flowcraft_runtime::run::RunScope;

    use super::*;

    #[test]
    fn test_new_run_body_shape() {
        let run = NewRun {
            run_id: RunId::from("run-1"),
            workflow_id: Some("wf-1".into()),
            scope: RunScope::Selected,
            node_count: 2,
            selected_node_ids: Some(vec!["a".into(), "b".into()]),
        };
        let json = serde_json::to_value(&run).unwrap();

        assert_eq!(json["workflowId"], "wf-1");
        assert_eq!(json["nodeCount"], 2);
        assert_eq!(json["selectedNodeIds"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_created_run_decodes() {
        let created: CreatedRun = crate::connect::decode(br#"{"runId":"run-42"}"#).unwrap();
        assert_eq!(created.run_id.as_str(), "run-42");
    }

    #[test]
    fn test_stored_workflow_decodes() {
        let body = br#"{
            "id": "wf-1",
            "name": "Captioner",
            "content": {
                "nodes": [
                    {"id": "t", "type": "text", "data": {"value": "hi"}, "position": {"x": 0, "y": 0}}
                ],
                "edges": []
            },
            "pastRuns": []
        }"#;
        let workflow: StoredWorkflow = crate::connect::decode(body).unwrap();
        assert_eq!(workflow.name, "Captioner");
        assert_eq!(workflow.content.node_count(), 1);
    }
}
