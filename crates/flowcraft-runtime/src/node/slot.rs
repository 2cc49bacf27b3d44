//! Typed input slots.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// A logical input of a node, selected by an edge's target handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InputSlot {
    /// Image to crop.
    Image,
    /// Video to sample.
    VideoUrl,
    /// LLM system prompt.
    SystemPrompt,
    /// LLM user message.
    UserMessage,
    /// Images attached to an LLM call.
    Images,
    /// Text node input.
    Input,
}

/// How values arriving on several edges combine into one slot value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Newline-joined text, in edge order.
    Concatenate,
    /// First usable URL, in edge order.
    First,
    /// Every usable URL, in edge order.
    Collect,
}

impl InputSlot {
    /// Aggregation applied to this slot.
    pub const fn aggregation(self) -> Aggregation {
        match self {
            Self::SystemPrompt | Self::UserMessage | Self::Input => Aggregation::Concatenate,
            Self::Image | Self::VideoUrl => Aggregation::First,
            Self::Images => Aggregation::Collect,
        }
    }
}
