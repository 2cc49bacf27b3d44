//! Node type tags and typed payloads.

use derive_more::From;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use super::data::{
    CropImageData, ExtractFrameData, LlmData, TextData, UploadImageData, UploadVideoData,
};
use super::slot::InputSlot;

/// Type tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString, EnumIter, IntoStaticStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum NodeType {
    /// Static text.
    Text,
    /// Uploaded image.
    UploadImage,
    /// Uploaded video.
    UploadVideo,
    /// Image crop.
    CropImage,
    /// Video frame extraction.
    ExtractFrame,
    /// Language model call.
    Llm,
}

impl NodeType {
    /// Input slots this node type accepts, in display order.
    pub fn input_slots(self) -> &'static [InputSlot] {
        match self {
            Self::Text => &[InputSlot::Input],
            Self::UploadImage | Self::UploadVideo => &[],
            Self::CropImage => &[InputSlot::Image],
            Self::ExtractFrame => &[InputSlot::VideoUrl],
            Self::Llm => &[InputSlot::SystemPrompt, InputSlot::UserMessage, InputSlot::Images],
        }
    }

    /// Slot fed by edges that carry no target handle.
    pub const fn default_slot(self) -> Option<InputSlot> {
        match self {
            Self::Text => Some(InputSlot::Input),
            Self::UploadImage | Self::UploadVideo => None,
            Self::CropImage => Some(InputSlot::Image),
            Self::ExtractFrame => Some(InputSlot::VideoUrl),
            Self::Llm => Some(InputSlot::UserMessage),
        }
    }

    /// Resolves an edge's target handle to one of this type's slots.
    ///
    /// Returns `None` for handles the type does not accept.
    pub fn slot_for_handle(self, handle: Option<&str>) -> Option<InputSlot> {
        let slot = match handle {
            None | Some("") => return self.default_slot(),
            Some(handle) => handle.parse::<InputSlot>().ok()?,
        };
        self.input_slots().contains(&slot).then_some(slot)
    }
}

/// Node payload, tagged by node type.
#[derive(Debug, Clone, PartialEq, From)]
pub enum NodeKind {
    /// Static text.
    Text(TextData),
    /// Uploaded image.
    UploadImage(UploadImageData),
    /// Uploaded video.
    UploadVideo(UploadVideoData),
    /// Image crop.
    CropImage(CropImageData),
    /// Video frame extraction.
    ExtractFrame(ExtractFrameData),
    /// Language model call.
    Llm(LlmData),
}

impl NodeKind {
    /// Creates the default payload for a node type.
    pub fn default_for(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Text => TextData::default().into(),
            NodeType::UploadImage => UploadImageData::default().into(),
            NodeType::UploadVideo => UploadVideoData::default().into(),
            NodeType::CropImage => CropImageData::default().into(),
            NodeType::ExtractFrame => ExtractFrameData::default().into(),
            NodeType::Llm => LlmData::default().into(),
        }
    }

    /// Returns the type tag.
    pub const fn node_type(&self) -> NodeType {
        match self {
            Self::Text(_) => NodeType::Text,
            Self::UploadImage(_) => NodeType::UploadImage,
            Self::UploadVideo(_) => NodeType::UploadVideo,
            Self::CropImage(_) => NodeType::CropImage,
            Self::ExtractFrame(_) => NodeType::ExtractFrame,
            Self::Llm(_) => NodeType::Llm,
        }
    }

    /// Returns the display label.
    pub fn label(&self) -> &str {
        match self {
            Self::Text(data) => &data.label,
            Self::UploadImage(data) => &data.label,
            Self::UploadVideo(data) => &data.label,
            Self::CropImage(data) => &data.label,
            Self::ExtractFrame(data) => &data.label,
            Self::Llm(data) => &data.label,
        }
    }

    /// Value the node offers downstream before it has produced a result.
    ///
    /// Only source-like nodes carry one: text nodes their value, upload nodes
    /// their uploaded URL.
    pub fn stored_value(&self) -> Option<&str> {
        match self {
            Self::Text(data) => Some(&data.value),
            Self::UploadImage(data) => data.image_url.as_deref(),
            Self::UploadVideo(data) => data.video_url.as_deref(),
            Self::CropImage(_) | Self::ExtractFrame(_) | Self::Llm(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_resolution() {
        assert_eq!(NodeType::Llm.slot_for_handle(None), Some(InputSlot::UserMessage));
        assert_eq!(
            NodeType::Llm.slot_for_handle(Some("system_prompt")),
            Some(InputSlot::SystemPrompt)
        );
        assert_eq!(NodeType::Llm.slot_for_handle(Some("image")), None);
        assert_eq!(NodeType::CropImage.slot_for_handle(Some("image")), Some(InputSlot::Image));
        assert_eq!(NodeType::UploadImage.slot_for_handle(None), None);
        assert_eq!(NodeType::Text.slot_for_handle(Some("bogus")), None);
    }

    #[test]
    fn test_type_tag_names() {
        assert_eq!(NodeType::UploadImage.as_ref(), "uploadImage");
        assert_eq!("extractFrame".parse::<NodeType>().unwrap(), NodeType::ExtractFrame);
        assert_eq!(
            serde_json::to_string(&NodeType::CropImage).unwrap(),
            "\"cropImage\""
        );
    }
}
