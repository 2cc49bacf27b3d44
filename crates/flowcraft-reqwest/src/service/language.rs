//! Language model backend over HTTP.

use flowcraft_core::{CompletionRequest, CompletionResponse, LanguageProvider, Result};
use serde::Deserialize;

use crate::connect::ReqwestClient;

/// Runs a completion.
pub const EXECUTE_LLM_PATH: &str = "api/trigger/execute-llm";

#[derive(Deserialize)]
struct CompletionBody {
    #[serde(default)]
    output: String,
}

#[async_trait::async_trait]
impl LanguageProvider for ReqwestClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let url = self.endpoint(EXECUTE_LLM_PATH)?;
        let body: CompletionBody = self.post_json(url, request).await?;
        Ok(CompletionResponse::new(body.output))
    }
}
