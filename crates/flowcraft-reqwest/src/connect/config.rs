//! Reqwest client configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default base URL of the workflow API.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Default timeout for HTTP requests: 60 seconds.
///
/// Media processing and completions routinely take tens of seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the flowcraft HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[serde(rename_all = "camelCase")]
pub struct ReqwestConfig {
    /// Base URL of the workflow API
    #[cfg_attr(
        feature = "config",
        arg(long = "api-url", env = "FLOWCRAFT_API_URL", default_value = DEFAULT_API_URL)
    )]
    pub api_url: Url,

    /// Bearer token sent with every request
    #[cfg_attr(
        feature = "config",
        arg(long = "api-token", env = "FLOWCRAFT_API_TOKEN", hide_env_values = true)
    )]
    #[serde(default, skip_serializing)]
    pub api_token: Option<String>,

    /// HTTP request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "http-timeout", env = "HTTP_TIMEOUT", default_value = "60")
    )]
    #[serde(default = "default_timeout_secs")]
    pub http_timeout: u64,

    /// User-Agent header to send with requests
    #[cfg_attr(
        feature = "config",
        arg(long = "http-user-agent", env = "HTTP_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ReqwestConfig {
    /// Creates a configuration for the API at `api_url`.
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            api_token: None,
            http_timeout: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
        }
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_api_token(mut self, api_token: impl Into<String>) -> Self {
        self.api_token = Some(api_token.into());
        self
    }

    /// Sets the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http_timeout = timeout_secs;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Returns the effective timeout, using the default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.http_timeout)
        }
    }

    /// Returns the effective user agent, using the default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(Self::default_user_agent)
    }

    /// Returns the API base with a trailing slash, so relative paths append.
    pub fn api_base(&self) -> Url {
        let mut base = self.api_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base
    }

    fn default_user_agent() -> String {
        format!("flowcraft/{}", env!("CARGO_PKG_VERSION"))
    }
}
