//! Node types for workflow graphs.
//!
//! This module provides the core node abstractions:
//! - [`NodeId`]: Unique identifier for nodes
//! - [`Node`]: A node with its typed payload ([`NodeKind`])
//! - [`InputSlot`]: Logical inputs selected by edge target handles
//! - [`NodeOutput`], [`NodeResult`], [`NodeStatus`]: Execution outcomes

mod data;
mod definition;
mod id;
mod kind;
mod output;
mod slot;

pub use data::{
    CropImageData, ExtractFrameData, FramePosition, FrameTimestamp, LlmData, Percent, TextData,
    UploadImageData, UploadVideoData,
};
pub(crate) use definition::decode_kind;
pub use definition::{Node, Position};
pub use id::NodeId;
pub use kind::{NodeKind, NodeType};
pub use output::{NodeOutput, NodeResult, NodeStatus};
pub use slot::{Aggregation, InputSlot};
