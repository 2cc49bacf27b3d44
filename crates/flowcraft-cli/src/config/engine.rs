//! Engine tuning options.

use std::time::Duration;

use anyhow::Context;
use clap::Args;
use flowcraft_runtime::engine::{EngineConfig, EngineConfigBuilder, UpstreamFailurePolicy};

/// Engine tuning options.
#[derive(Debug, Clone, Args)]
pub struct EngineArgs {
    /// Maximum number of nodes executing at once
    #[arg(long, env = "FLOWCRAFT_MAX_CONCURRENT_NODES", default_value_t = 16)]
    pub max_concurrent_nodes: usize,

    /// Time limit for a single node, in seconds
    #[arg(long, env = "FLOWCRAFT_NODE_TIMEOUT")]
    pub node_timeout_secs: Option<u64>,

    /// Fail nodes whose upstream failed instead of running them
    #[arg(long, env = "FLOWCRAFT_FAIL_FAST")]
    pub fail_fast: bool,
}

impl EngineArgs {
    /// Builds the engine configuration.
    pub fn build(&self) -> anyhow::Result<EngineConfig> {
        let mut builder = EngineConfigBuilder::default();
        builder.max_concurrent_nodes(self.max_concurrent_nodes);

        if let Some(secs) = self.node_timeout_secs {
            builder.node_timeout(Duration::from_secs(secs));
        }
        if self.fail_fast {
            builder.upstream_failure(UpstreamFailurePolicy::Fail);
        }

        builder.build().context("invalid engine configuration")
    }
}
