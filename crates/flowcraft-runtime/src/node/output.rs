//! Node outputs, results and execution status.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use url::Url;

use super::NodeId;

/// Output produced by a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NodeOutput {
    /// Text output.
    Text(String),
    /// Public URL of a media artifact.
    Url(Url),
    /// No value, e.g. an upload node that was never uploaded.
    #[default]
    Null,
}

impl NodeOutput {
    /// Returns the value passed to downstream nodes, if any.
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Url(url) => Some(url.as_str()),
            Self::Null => None,
        }
    }

    /// Returns whether this output carries no value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Latest outcome of a node, overwritten on every execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResult {
    /// Node the result belongs to.
    pub node_id: NodeId,
    /// Output value; null when the node failed.
    pub output: NodeOutput,
    /// When the node finished.
    pub timestamp: Timestamp,
    /// Error message when the node failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodeResult {
    /// Creates a successful result.
    pub fn success(node_id: NodeId, output: NodeOutput) -> Self {
        Self {
            node_id,
            output,
            timestamp: Timestamp::now(),
            error: None,
        }
    }

    /// Creates a failed result.
    pub fn failure(node_id: NodeId, error: impl Into<String>) -> Self {
        Self {
            node_id,
            output: NodeOutput::Null,
            timestamp: Timestamp::now(),
            error: Some(error.into()),
        }
    }

    /// Returns whether the result records a failure.
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Execution status of a node within the current session.
///
/// Transitions are `idle -> running -> success | failed`; a new run resets
/// in-scope nodes to `idle` first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeStatus {
    /// Not run yet in the current run.
    #[default]
    Idle,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Success,
    /// Finished with an error.
    Failed,
}

impl NodeStatus {
    /// Returns whether the status is final for the current run.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}
