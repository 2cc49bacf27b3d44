//! Collaborator selection: HTTP providers or in-process mocks.

use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use flowcraft_core::{LanguageService, MediaService, UploadService};
use flowcraft_reqwest::{ReqwestClient, ReqwestConfig};
use flowcraft_runtime::run::{MemoryRunStore, RunStore};
use flowcraft_test::{
    MockLanguageConfig, MockLanguageProvider, MockMediaConfig, MockMediaProvider,
    MockUploadConfig, MockUploadProvider,
};

use crate::TRACING_TARGET_CONFIG;

/// Provider options.
#[derive(Debug, Clone, Args)]
pub struct ProviderArgs {
    /// Use in-process mock providers instead of the workflow API
    #[arg(long, env = "FLOWCRAFT_MOCK")]
    pub mock: bool,

    /// Workflow API connection.
    #[clap(flatten)]
    pub http: ReqwestConfig,

    /// Mock media behaviour.
    #[clap(flatten)]
    pub mock_media: MockMediaConfig,

    /// Mock language behaviour.
    #[clap(flatten)]
    pub mock_language: MockLanguageConfig,

    /// Mock upload behaviour.
    #[clap(flatten)]
    pub mock_upload: MockUploadConfig,
}

/// The collaborators a command works with.
#[derive(Clone)]
pub struct Services {
    pub media: MediaService,
    pub language: LanguageService,
    pub upload: UploadService,
    pub store: Arc<dyn RunStore>,
}

impl ProviderArgs {
    /// Creates the services selected by these options.
    pub fn create_services(&self) -> anyhow::Result<Services> {
        if self.mock {
            tracing::info!(
                target: TRACING_TARGET_CONFIG,
                image_width = self.mock_media.image_width,
                image_height = self.mock_media.image_height,
                video_duration_secs = self.mock_media.video_duration_secs,
                "Using mock providers"
            );

            return Ok(Services {
                media: MediaService::new(MockMediaProvider::new(self.mock_media.clone())),
                language: LanguageService::new(MockLanguageProvider::new(
                    self.mock_language.clone(),
                )),
                upload: UploadService::new(MockUploadProvider::new(self.mock_upload.clone())),
                store: Arc::new(MemoryRunStore::default()),
            });
        }

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            api_url = %self.http.api_url,
            timeout_secs = self.http.effective_timeout().as_secs(),
            authenticated = self.http.api_token.is_some(),
            "Using workflow API providers"
        );

        let client =
            ReqwestClient::new(self.http.clone()).context("failed to create the HTTP client")?;

        Ok(Services {
            media: client.clone().into_media_service(),
            language: client.clone().into_language_service(),
            upload: client.clone().into_upload_service(),
            store: client.into_run_store(),
        })
    }
}
