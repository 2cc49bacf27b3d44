//! Language service wrapper with observability.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use super::{CompletionRequest, CompletionResponse, LanguageProvider};
use crate::{Result, TRACING_TARGET_LANGUAGE};

/// Language service wrapper with observability.
///
/// Adds structured logging to any [`LanguageProvider`] implementation.
#[derive(Clone)]
pub struct LanguageService {
    inner: Arc<dyn LanguageProvider>,
}

impl fmt::Debug for LanguageService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageService").finish_non_exhaustive()
    }
}

impl LanguageService {
    /// Creates a new language service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: LanguageProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Generates a completion for the request.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET_LANGUAGE,
            model = %request.model,
            has_system_prompt = request.system_prompt.is_some(),
            message_len = request.user_message.len(),
            image_count = request.image_urls.len(),
            "Requesting completion"
        );

        let result = self.inner.complete(request).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(response) => tracing::debug!(
                target: TRACING_TARGET_LANGUAGE,
                model = %request.model,
                response_len = response.text.len(),
                elapsed_ms = elapsed.as_millis(),
                "Completion received"
            ),
            Err(error) => tracing::error!(
                target: TRACING_TARGET_LANGUAGE,
                model = %request.model,
                error = %error,
                elapsed_ms = elapsed.as_millis(),
                "Completion failed"
            ),
        }

        result
    }
}
