//! Workflow document import and export.

use serde::{Deserialize, Serialize};

use super::{Edge, WorkflowGraph};
use crate::error::{WorkflowError, WorkflowResult};
use crate::node::Node;

/// The persisted JSON form of a workflow: `{ name?, nodes, edges }`.
///
/// Node payloads may be partial; missing fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    /// Workflow name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Nodes in editor order.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Edges in insertion order.
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl WorkflowDocument {
    /// Creates a document from a graph.
    pub fn from_graph(name: Option<String>, graph: &WorkflowGraph) -> Self {
        Self {
            name,
            nodes: graph.nodes().to_vec(),
            edges: graph.edges().to_vec(),
        }
    }

    /// Parses a document from JSON.
    pub fn from_json(json: &str) -> WorkflowResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Renders the document as pretty-printed JSON.
    pub fn to_json(&self) -> WorkflowResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Converts the document into a graph, enforcing its invariants.
    pub fn into_graph(self) -> WorkflowResult<WorkflowGraph> {
        WorkflowGraph::from_parts(self.nodes, self.edges)
    }
}

impl TryFrom<WorkflowDocument> for WorkflowGraph {
    type Error = WorkflowError;

    fn try_from(document: WorkflowDocument) -> Result<Self, Self::Error> {
        document.into_graph()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeKind, NodeType};

    const DOCUMENT: &str = r#"{
        "name": "Demo",
        "nodes": [
            { "id": "t", "type": "text", "data": { "value": "describe this" } },
            { "id": "u", "type": "uploadImage", "data": { "imageUrl": "https://cdn.test/a.png" } },
            { "id": "l", "type": "llm", "data": {}, "position": { "x": 300, "y": 40 } }
        ],
        "edges": [
            { "id": "e1", "source": "t", "target": "l", "targetHandle": "user_message" },
            { "id": "e2", "source": "u", "target": "l", "targetHandle": "images" },
            { "id": "e3", "source": "t", "target": "l", "targetHandle": "user_message" }
        ]
    }"#;

    #[test]
    fn test_import_dedupes_edges() {
        let graph = WorkflowDocument::from_json(DOCUMENT)
            .unwrap()
            .into_graph()
            .unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);

        let llm = graph.node(&"l".into()).unwrap();
        assert_eq!(llm.node_type(), NodeType::Llm);
        assert!(matches!(llm.kind(), NodeKind::Llm(data) if data.label == "LLM"));
    }

    #[test]
    fn test_export_then_import() {
        let graph: WorkflowGraph = serde_json::from_str(DOCUMENT).unwrap();
        let exported = WorkflowDocument::from_graph(Some("Demo".into()), &graph)
            .to_json()
            .unwrap();
        let imported = WorkflowDocument::from_json(&exported).unwrap();

        assert_eq!(imported.name.as_deref(), Some("Demo"));
        assert_eq!(imported.into_graph().unwrap(), graph);
    }

    #[test]
    fn test_import_rejects_dangling_edge() {
        let json = r#"{ "nodes": [], "edges": [{ "id": "e", "source": "a", "target": "b" }] }"#;
        assert!(serde_json::from_str::<WorkflowGraph>(json).is_err());
    }
}
