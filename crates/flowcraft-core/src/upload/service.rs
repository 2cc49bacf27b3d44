//! Upload service wrapper with observability.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use url::Url;

use super::{UploadFile, UploadPolicy, UploadProvider};
use crate::{Result, TRACING_TARGET_UPLOAD};

/// Upload service wrapper.
///
/// Checks every file against an [`UploadPolicy`] before handing it to the
/// provider, and logs the outcome.
#[derive(Clone)]
pub struct UploadService {
    inner: Arc<dyn UploadProvider>,
}

impl fmt::Debug for UploadService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadService").finish_non_exhaustive()
    }
}

impl UploadService {
    /// Creates a new upload service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: UploadProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Uploads a file after checking it against `policy`.
    pub async fn upload(&self, file: &UploadFile, policy: &UploadPolicy) -> Result<Url> {
        if let Err(error) = policy.check(file) {
            tracing::warn!(
                target: TRACING_TARGET_UPLOAD,
                file_name = %file.file_name,
                content_type = %file.content_type,
                size = file.size(),
                error = %error,
                "Upload rejected by policy"
            );
            return Err(error);
        }

        let started_at = Instant::now();
        let result = self.inner.upload(file).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(url) => tracing::info!(
                target: TRACING_TARGET_UPLOAD,
                file_name = %file.file_name,
                size = file.size(),
                url = %url,
                elapsed_ms = elapsed.as_millis(),
                "File uploaded"
            ),
            Err(error) => tracing::error!(
                target: TRACING_TARGET_UPLOAD,
                file_name = %file.file_name,
                error = %error,
                elapsed_ms = elapsed.as_millis(),
                "Upload failed"
            ),
        }

        result
    }
}
