//! Reqwest-based HTTP client for the workflow API.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use flowcraft_core::{LanguageService, MediaService, UploadService};
use flowcraft_runtime::run::RunStore;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::ReqwestConfig;
use crate::error::{Error, Result};

/// Tracing target for reqwest client operations.
pub const TRACING_TARGET: &str = "flowcraft_reqwest::client";

/// Inner client that holds the HTTP client and configuration.
struct ReqwestClientInner {
    http: Client,
    config: ReqwestConfig,
}

/// Reqwest-based HTTP client for the workflow API.
///
/// One client implements every collaborator contract; clones share the
/// connection pool.
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("api_url", &self.inner.config.api_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ReqwestClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: ReqwestConfig) -> flowcraft_core::Result<Self> {
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            api_url = %config.api_url,
            timeout_ms = timeout.as_millis(),
            "Creating reqwest client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .map_err(|e| {
                flowcraft_core::Error::configuration()
                    .with_message("failed to create HTTP client")
                    .with_source(e)
            })?;

        let inner = ReqwestClientInner { http, config };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Converts this client into a [`MediaService`].
    pub fn into_media_service(self) -> MediaService {
        MediaService::new(self)
    }

    /// Converts this client into a [`LanguageService`].
    pub fn into_language_service(self) -> LanguageService {
        LanguageService::new(self)
    }

    /// Converts this client into an [`UploadService`].
    pub fn into_upload_service(self) -> UploadService {
        UploadService::new(self)
    }

    /// Converts this client into a shared [`RunStore`].
    pub fn into_run_store(self) -> Arc<dyn RunStore> {
        Arc::new(self)
    }

    /// Resolves a path relative to the API base.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.inner.config.api_base().join(path)?)
    }

    /// Resolves a path followed by one percent-encoded segment.
    pub(crate) fn endpoint_with_segment(&self, path: &str, segment: &str) -> Result<Url> {
        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|()| Error::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    /// Sends a JSON body and decodes the JSON response.
    pub(crate) async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.inner.http.post(url.clone()).json(body);
        self.send(url, request).await
    }

    /// Sends a multipart form and decodes the JSON response.
    pub(crate) async fn post_multipart<T>(&self, url: Url, form: reqwest::multipart::Form) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request = self.inner.http.post(url.clone()).multipart(form);
        self.send(url, request).await
    }

    /// Fetches and decodes a JSON resource.
    pub(crate) async fn get_json<T>(&self, url: Url) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request = self.inner.http.get(url.clone());
        self.send(url, request).await
    }

    async fn send<T>(&self, url: Url, mut request: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        if let Some(token) = &self.inner.config.api_token {
            request = request.bearer_auth(token);
        }

        let started_at = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        tracing::debug!(
            target: TRACING_TARGET,
            url = %url,
            status = status.as_u16(),
            body_len = body.len(),
            elapsed_ms = started_at.elapsed().as_millis(),
            "HTTP request completed"
        );

        if !status.is_success() {
            return Err(Error::Status {
                status,
                message: error_message(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_owned()),
            });
        }

        decode(&body)
    }
}

/// Extracts the `error` field of a JSON error body.
fn error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value.get("error")?.as_str().map(str::to_owned)
}

/// Decodes a success body, honouring an explicit `"success": false`.
pub(crate) fn decode<T>(body: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let value: serde_json::Value = serde_json::from_slice(body)?;
    if value.get("success").and_then(serde_json::Value::as_bool) == Some(false) {
        let message = value
            .get("error")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("request reported failure");
        return Err(Error::Rejected(message.to_owned()));
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Output {
        output: String,
    }

    fn client() -> ReqwestClient {
        ReqwestClient::new(ReqwestConfig::new(Url::parse("https://flowcraft.test").unwrap())).unwrap()
    }

    #[test]
    fn test_decode_success_body() {
        let output: Output = decode(br#"{"success":true,"output":"hi"}"#).unwrap();
        assert_eq!(output.output, "hi");
    }

    #[test]
    fn test_decode_reported_failure() {
        let error = decode::<Output>(br#"{"success":false,"error":"boom"}"#).unwrap_err();
        assert!(matches!(error, Error::Rejected(message) if message == "boom"));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(br#"{"error":"Workflow ID required"}"#).as_deref(),
            Some("Workflow ID required")
        );
        assert_eq!(error_message(b"<html>"), None);
    }

    #[test]
    fn test_endpoint_segment_is_encoded() {
        let url = client()
            .endpoint_with_segment("api/workflows/", "wf 1/x")
            .unwrap();
        assert_eq!(url.as_str(), "https://flowcraft.test/api/workflows/wf%201%2Fx");
    }

    #[tokio::test]
    async fn test_connection_failure_maps_to_network_error() {
        let config = ReqwestConfig::new(Url::parse("http://127.0.0.1:9").unwrap()).with_timeout(5);
        let client = ReqwestClient::new(config).unwrap();
        let url = client.endpoint("api/workflows").unwrap();

        let error: flowcraft_core::Error = client
            .get_json::<serde_json::Value>(url)
            .await
            .unwrap_err()
            .into();
        assert!(error.kind().is_retryable());
    }
}
