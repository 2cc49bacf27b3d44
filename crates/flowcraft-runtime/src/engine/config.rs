//! Engine configuration.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::run::DEFAULT_HISTORY_LIMIT;

/// What happens to a node whose in-scope dependency failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UpstreamFailurePolicy {
    /// Run the node anyway; it fails on its own if an input is missing.
    #[default]
    Attempt,
    /// Fail the node without running it.
    Fail,
}

/// Configuration for the workflow execution engine.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct EngineConfig {
    /// Maximum number of nodes executing at once within a run.
    #[builder(default = "16")]
    pub max_concurrent_nodes: usize,

    /// Time limit for a single node.
    #[builder(default, setter(into, strip_option))]
    pub node_timeout: Option<Duration>,

    /// Handling of nodes downstream of a failure.
    #[builder(default)]
    pub upstream_failure: UpstreamFailurePolicy,

    /// Number of runs a session keeps in its history.
    #[builder(default = "DEFAULT_HISTORY_LIMIT")]
    pub history_limit: usize,
}

impl EngineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_nodes == Some(0) {
            return Err("max_concurrent_nodes must be at least 1".into());
        }
        if let Some(Some(timeout)) = self.node_timeout
            && timeout.is_zero()
        {
            return Err("node_timeout must be greater than zero".into());
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_nodes: 16,
            node_timeout: None,
            upstream_failure: UpstreamFailurePolicy::Attempt,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = EngineConfigBuilder::default().build().unwrap();
        assert_eq!(config.max_concurrent_nodes, 16);
        assert_eq!(config.node_timeout, None);
        assert_eq!(config.upstream_failure, UpstreamFailurePolicy::Attempt);
        assert_eq!(config.history_limit, 50);
    }

    #[test]
    fn test_builder_validation() {
        assert!(
            EngineConfigBuilder::default()
                .max_concurrent_nodes(0usize)
                .build()
                .is_err()
        );
        assert!(
            EngineConfigBuilder::default()
                .node_timeout(Duration::ZERO)
                .build()
                .is_err()
        );

        let config = EngineConfigBuilder::default()
            .node_timeout(Duration::from_secs(30))
            .upstream_failure(UpstreamFailurePolicy::Fail)
            .build()
            .unwrap();
        assert_eq!(config.node_timeout, Some(Duration::from_secs(30)));
    }
}
