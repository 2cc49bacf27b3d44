//! Mock language provider for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use flowcraft_core::{CompletionRequest, CompletionResponse, Error, LanguageProvider, Result};
use serde::{Deserialize, Serialize};

/// Prefix the mock puts in front of echoed user messages.
pub const ECHO_PREFIX: &str = "ECHO: ";

/// Configuration for the mock language provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct MockLanguageConfig {
    /// Fixed reply; when unset the user message is echoed back.
    #[cfg_attr(feature = "config", arg(long = "mock-reply"))]
    pub reply: Option<String>,

    /// Fails any request whose user message contains this text.
    #[cfg_attr(feature = "config", arg(skip))]
    pub fail_when_contains: Option<String>,

    /// Artificial latency added to every call, in milliseconds.
    #[cfg_attr(feature = "config", arg(long = "mock-delay-ms", default_value_t = 0))]
    #[serde(default)]
    pub delay_ms: u64,
}

#[derive(Debug, Default)]
struct Concurrency {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Mock language provider for testing.
///
/// Echoes `"ECHO: <user message>"` by default. Clones share the request log
/// and the concurrency counters.
#[derive(Clone, Default, Debug)]
pub struct MockLanguageProvider {
    config: MockLanguageConfig,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    concurrency: Arc<Concurrency>,
}

impl MockLanguageProvider {
    /// Creates a new mock language provider with the given configuration.
    pub fn new(config: MockLanguageConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Creates a provider that always replies with `reply`.
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self::new(MockLanguageConfig {
            reply: Some(reply.into()),
            ..MockLanguageConfig::default()
        })
    }

    /// Creates a provider that fails requests mentioning `needle`.
    pub fn failing_on(needle: impl Into<String>) -> Self {
        Self::new(MockLanguageConfig {
            fail_when_contains: Some(needle.into()),
            ..MockLanguageConfig::default()
        })
    }

    /// Adds artificial latency to every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.config.delay_ms = delay.as_millis() as u64;
        self
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the highest number of calls that were in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.concurrency.peak.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LanguageProvider for MockLanguageProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let current = self.concurrency.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.concurrency.peak.fetch_max(current, Ordering::SeqCst);

        if self.config.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.delay_ms)).await;
        }

        self.concurrency.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(needle) = &self.config.fail_when_contains
            && request.user_message.contains(needle.as_str())
        {
            return Err(Error::external_error().with_message("mock completion failure"));
        }

        let text = match &self.config.reply {
            Some(reply) => reply.clone(),
            None => format!("{ECHO_PREFIX}{}", request.user_message),
        };

        Ok(CompletionResponse::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo() {
        let mock = MockLanguageProvider::default();
        let response = mock.complete(&CompletionRequest::new("hello")).await.unwrap();
        assert_eq!(response.text, "ECHO: hello");
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_fail_when_contains() {
        let mock = MockLanguageProvider::failing_on("boom");
        assert!(mock.complete(&CompletionRequest::new("boom")).await.is_err());
        assert!(mock.complete(&CompletionRequest::new("fine")).await.is_ok());
    }
}
