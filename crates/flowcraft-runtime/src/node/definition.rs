//! Workflow node definition.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::{NodeId, NodeKind, NodeType};
use crate::error::{WorkflowError, WorkflowResult};

/// Editor canvas position, carried through import and export unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

/// A node in a workflow graph.
///
/// The node type is fixed at creation; only the payload of the same type can
/// be replaced afterwards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawNode")]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    position: Position,
}

impl Node {
    /// Creates a node with the given ID and payload.
    pub fn new(id: impl Into<NodeId>, kind: impl Into<NodeKind>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            position: Position::default(),
        }
    }

    /// Creates a node of the given type with a generated ID and default payload.
    pub fn create(node_type: NodeType) -> Self {
        Self::new(NodeId::generate(node_type), NodeKind::default_for(node_type))
    }

    /// Sets the canvas position.
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Position { x, y };
        self
    }

    /// Returns the node ID.
    #[inline]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Returns the node payload.
    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the node type.
    #[inline]
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Returns the display label.
    pub fn label(&self) -> &str {
        self.kind.label()
    }

    /// Returns the canvas position.
    pub fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Replaces the payload, rejecting a change of node type.
    pub(crate) fn replace_kind(&mut self, kind: NodeKind) -> WorkflowResult<()> {
        if kind.node_type() != self.node_type() {
            return Err(WorkflowError::InvalidDefinition(format!(
                "node {} is a {} node and cannot become a {} node",
                self.id,
                self.node_type(),
                kind.node_type()
            )));
        }

        self.kind = kind;
        Ok(())
    }

    /// Serializes the payload alone, as stored under `data`.
    pub(crate) fn data_value(&self) -> serde_json::Result<serde_json::Value> {
        match &self.kind {
            NodeKind::Text(data) => serde_json::to_value(data),
            NodeKind::UploadImage(data) => serde_json::to_value(data),
            NodeKind::UploadVideo(data) => serde_json::to_value(data),
            NodeKind::CropImage(data) => serde_json::to_value(data),
            NodeKind::ExtractFrame(data) => serde_json::to_value(data),
            NodeKind::Llm(data) => serde_json::to_value(data),
        }
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Node", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", &self.node_type())?;
        match &self.kind {
            NodeKind::Text(data) => state.serialize_field("data", data)?,
            NodeKind::UploadImage(data) => state.serialize_field("data", data)?,
            NodeKind::UploadVideo(data) => state.serialize_field("data", data)?,
            NodeKind::CropImage(data) => state.serialize_field("data", data)?,
            NodeKind::ExtractFrame(data) => state.serialize_field("data", data)?,
            NodeKind::Llm(data) => state.serialize_field("data", data)?,
        }
        state.serialize_field("position", &self.position)?;
        state.end()
    }
}

/// Wire form of a node; `data` may be missing or partial.
#[derive(Deserialize)]
struct RawNode {
    id: NodeId,
    #[serde(rename = "type")]
    node_type: NodeType,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    position: Position,
}

/// Decodes a (possibly partial) payload of the given type.
pub(crate) fn decode_kind(
    node_type: NodeType,
    data: serde_json::Value,
) -> serde_json::Result<NodeKind> {
    let data = match data {
        serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
        data => data,
    };

    Ok(match node_type {
        NodeType::Text => NodeKind::Text(serde_json::from_value(data)?),
        NodeType::UploadImage => NodeKind::UploadImage(serde_json::from_value(data)?),
        NodeType::UploadVideo => NodeKind::UploadVideo(serde_json::from_value(data)?),
        NodeType::CropImage => NodeKind::CropImage(serde_json::from_value(data)?),
        NodeType::ExtractFrame => NodeKind::ExtractFrame(serde_json::from_value(data)?),
        NodeType::Llm => NodeKind::Llm(serde_json::from_value(data)?),
    })
}

impl TryFrom<RawNode> for Node {
    type Error = serde_json::Error;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id,
            kind: decode_kind(raw.node_type, raw.data)?,
            position: raw.position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{CropImageData, LlmData, Percent, TextData};

    #[test]
    fn test_node_json_shape() {
        let node = Node::new("t1", TextData::new("hello")).with_position(10.0, 20.0);
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(json["id"], "t1");
        assert_eq!(json["type"], "text");
        assert_eq!(json["data"]["value"], "hello");
        assert_eq!(json["position"]["x"], 10.0);

        let decoded: Node = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn test_missing_data_is_defaulted() {
        let node: Node = serde_json::from_str(r#"{"id": "c1", "type": "cropImage"}"#).unwrap();
        let NodeKind::CropImage(data) = node.kind() else {
            panic!("expected a crop node");
        };
        assert_eq!(data.width_percent, Percent::FULL);
        assert_eq!(data.image_url, None);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result = serde_json::from_str::<Node>(r#"{"id": "x", "type": "teleport"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_type_is_immutable() {
        let mut node = Node::new("n", LlmData::new("hi"));
        assert!(node.replace_kind(CropImageData::new().into()).is_err());
        assert!(node.replace_kind(LlmData::new("bye").into()).is_ok());
        assert_eq!(node.node_type(), NodeType::Llm);
    }
}
