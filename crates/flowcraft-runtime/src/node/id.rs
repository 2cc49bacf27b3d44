//! Node identifier type.

use std::borrow::Borrow;

use derive_more::{Debug, Display, From, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::NodeType;

/// Unique identifier for a node in a workflow graph.
///
/// Identifiers are opaque strings so documents authored elsewhere keep their
/// ids verbatim.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node ID from a string.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh, time-ordered ID for a node of the given type.
    pub fn generate(node_type: NodeType) -> Self {
        Self(format!("{node_type}-{}", Uuid::now_v7().simple()))
    }

    /// Returns the ID as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = NodeId::generate(NodeType::CropImage);
        let b = NodeId::generate(NodeType::CropImage);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("cropImage-"));
    }
}
