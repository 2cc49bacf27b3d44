//! Mock upload provider for testing.

use std::sync::{Arc, Mutex, PoisonError};

#[cfg(feature = "config")]
use clap::Args;
use flowcraft_core::{Result, UploadFile, UploadProvider};
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for the mock upload provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct MockUploadConfig {
    /// Base URL under which uploaded files are published.
    #[cfg_attr(
        feature = "config",
        arg(id = "mock_upload_base_url", long = "mock-upload-base-url", default_value = "https://uploads.flowcraft.test")
    )]
    pub base_url: String,
}

impl Default for MockUploadConfig {
    fn default() -> Self {
        Self {
            base_url: "https://uploads.flowcraft.test".to_owned(),
        }
    }
}

/// Mock upload provider for testing.
///
/// Publishes every file under `<base_url>/<file_name>`.
#[derive(Clone, Default, Debug)]
pub struct MockUploadProvider {
    config: MockUploadConfig,
    uploaded: Arc<Mutex<Vec<String>>>,
}

impl MockUploadProvider {
    /// Creates a new mock upload provider with the given configuration.
    pub fn new(config: MockUploadConfig) -> Self {
        Self {
            config,
            uploaded: Arc::default(),
        }
    }

    /// Returns the names of all files uploaded so far.
    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl UploadProvider for MockUploadProvider {
    async fn upload(&self, file: &UploadFile) -> Result<Url> {
        self.uploaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(file.file_name.clone());

        let mut url = Url::parse(&self.config.base_url)?;
        url.path_segments_mut()
            .map_err(|()| flowcraft_core::Error::configuration().with_message("base URL cannot be a base"))?
            .pop_if_empty()
            .push(&file.file_name);
        Ok(url)
    }
}
