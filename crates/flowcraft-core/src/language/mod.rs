//! Language model completion.

mod service;

use serde::{Deserialize, Serialize};
pub use service::LanguageService;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use url::Url;

use crate::Result;

/// Language models a completion may be routed to.
///
/// Unknown model names fall back to the default model instead of failing,
/// so stale workflow documents keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(AsRefStr, Display, EnumString, EnumIter)]
#[derive(Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LanguageModel {
    /// General purpose multimodal model.
    #[default]
    #[strum(serialize = "gemini-2.5-flash")]
    GeminiFlash,
    /// Lower latency variant.
    #[strum(serialize = "gemini-2.5-flash-lite")]
    GeminiFlashLite,
}

impl LanguageModel {
    /// Resolves a model name, falling back to the default for unknown names.
    pub fn resolve(name: &str) -> Self {
        name.trim().parse().unwrap_or_default()
    }
}

impl From<String> for LanguageModel {
    fn from(name: String) -> Self {
        Self::resolve(&name)
    }
}

impl From<LanguageModel> for String {
    fn from(model: LanguageModel) -> Self {
        model.as_ref().to_owned()
    }
}

/// A single completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    /// Optional system instruction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// The user message.
    pub user_message: String,
    /// Images attached to the message.
    #[serde(default)]
    pub image_urls: Vec<Url>,
    /// Target model.
    #[serde(default)]
    pub model: LanguageModel,
}

impl CompletionRequest {
    /// Creates a request with only a user message.
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            system_prompt: None,
            user_message: user_message.into(),
            image_urls: Vec::new(),
            model: LanguageModel::default(),
        }
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Sets the attached images.
    pub fn with_images(mut self, image_urls: Vec<Url>) -> Self {
        self.image_urls = image_urls;
        self
    }

    /// Sets the model.
    pub fn with_model(mut self, model: LanguageModel) -> Self {
        self.model = model;
        self
    }
}

/// Completion returned by a language provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated text.
    pub text: String,
}

impl CompletionResponse {
    /// Creates a response from generated text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Contract for the remote language model backend.
#[async_trait::async_trait]
pub trait LanguageProvider: Send + Sync {
    /// Generates a completion for the request.
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;
}
