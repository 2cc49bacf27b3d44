//! Type-specific node payloads.
//!
//! Every field has a default, so a payload deserialized from an incomplete
//! document is always fully populated.

use derive_more::Display;
use flowcraft_core::{LanguageModel, PercentRect};
use serde::{Deserialize, Serialize};

use crate::error::NodeError;

/// A percentage clamped to `[0, 100]` on construction.
#[derive(Debug, Display, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Percent(f64);

impl Percent {
    /// Zero percent.
    pub const ZERO: Self = Self(0.0);
    /// One hundred percent.
    pub const FULL: Self = Self(100.0);

    /// Creates a percentage, clamping into `[0, 100]`. NaN becomes zero.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 100.0))
    }

    /// Returns the percentage value.
    #[inline]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl From<f64> for Percent {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Percent> for f64 {
    fn from(percent: Percent) -> Self {
        percent.0
    }
}

/// Where in a video to extract a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FramePosition {
    /// Absolute offset in seconds.
    Seconds(f64),
    /// Offset relative to the video duration.
    Percent(Percent),
}

/// Frame timestamp as entered: plain seconds (`"12.5"`) or a percentage
/// of the duration (`"50%"`).
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "TimestampRepr", into = "String")]
pub struct FrameTimestamp(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum TimestampRepr {
    Text(String),
    Number(f64),
}

impl From<TimestampRepr> for FrameTimestamp {
    fn from(repr: TimestampRepr) -> Self {
        match repr {
            TimestampRepr::Text(text) => Self(text),
            TimestampRepr::Number(seconds) => Self(seconds.to_string()),
        }
    }
}

impl From<FrameTimestamp> for String {
    fn from(timestamp: FrameTimestamp) -> Self {
        timestamp.0
    }
}

impl Default for FrameTimestamp {
    fn default() -> Self {
        Self("0".to_owned())
    }
}

impl FrameTimestamp {
    /// Creates a timestamp from its textual form.
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self(timestamp.into())
    }

    /// Returns the timestamp as entered.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the timestamp into a frame position.
    pub fn position(&self) -> Result<FramePosition, NodeError> {
        let text = self.0.trim();
        let invalid = || NodeError::validation(format!("invalid frame timestamp: {:?}", self.0));

        if text.is_empty() {
            return Ok(FramePosition::Seconds(0.0));
        }

        if let Some(percent) = text.strip_suffix('%') {
            let value: f64 = percent.trim().parse().map_err(|_| invalid())?;
            if !value.is_finite() || value < 0.0 {
                return Err(invalid());
            }
            return Ok(FramePosition::Percent(Percent::new(value)));
        }

        let seconds: f64 = text.parse().map_err(|_| invalid())?;
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(invalid());
        }
        Ok(FramePosition::Seconds(seconds))
    }
}

/// Static text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextData {
    /// Text value.
    pub value: String,
    /// Display label.
    pub label: String,
}

impl TextData {
    /// Creates a text payload.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }
}

impl Default for TextData {
    fn default() -> Self {
        Self {
            value: String::new(),
            label: "Text".to_owned(),
        }
    }
}

/// An uploaded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadImageData {
    /// Public URL, once uploaded.
    pub image_url: Option<String>,
    /// Display label.
    pub label: String,
}

impl UploadImageData {
    /// Creates a payload for an already uploaded image.
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: Some(image_url.into()),
            ..Self::default()
        }
    }
}

impl Default for UploadImageData {
    fn default() -> Self {
        Self {
            image_url: None,
            label: "Upload Image".to_owned(),
        }
    }
}

/// An uploaded video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadVideoData {
    /// Public URL, once uploaded.
    pub video_url: Option<String>,
    /// Display label.
    pub label: String,
}

impl UploadVideoData {
    /// Creates a payload for an already uploaded video.
    pub fn new(video_url: impl Into<String>) -> Self {
        Self {
            video_url: Some(video_url.into()),
            ..Self::default()
        }
    }
}

impl Default for UploadVideoData {
    fn default() -> Self {
        Self {
            video_url: None,
            label: "Upload Video".to_owned(),
        }
    }
}

/// Crops an image to a percentage region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CropImageData {
    /// Image to crop when no edge feeds the `image` slot.
    pub image_url: Option<String>,
    /// Left offset.
    pub x_percent: Percent,
    /// Top offset.
    pub y_percent: Percent,
    /// Region width.
    pub width_percent: Percent,
    /// Region height.
    pub height_percent: Percent,
    /// Display label.
    pub label: String,
}

impl CropImageData {
    /// Creates a crop covering the whole image.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the local image URL.
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Sets the crop region, clamping each value into `[0, 100]`.
    pub fn with_region(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.x_percent = Percent::new(x);
        self.y_percent = Percent::new(y);
        self.width_percent = Percent::new(width);
        self.height_percent = Percent::new(height);
        self
    }

    /// Returns the crop region.
    pub fn region(&self) -> PercentRect {
        PercentRect::new(
            self.x_percent.get(),
            self.y_percent.get(),
            self.width_percent.get(),
            self.height_percent.get(),
        )
    }
}

impl Default for CropImageData {
    fn default() -> Self {
        Self {
            image_url: None,
            x_percent: Percent::ZERO,
            y_percent: Percent::ZERO,
            width_percent: Percent::FULL,
            height_percent: Percent::FULL,
            label: "Crop Image".to_owned(),
        }
    }
}

/// Extracts a single frame from a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractFrameData {
    /// Video to sample when no edge feeds the `video_url` slot.
    pub video_url: Option<String>,
    /// Frame position.
    pub timestamp: FrameTimestamp,
    /// Display label.
    pub label: String,
}

impl ExtractFrameData {
    /// Creates a payload extracting the frame at `timestamp`.
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: FrameTimestamp::new(timestamp),
            ..Self::default()
        }
    }

    /// Sets the local video URL.
    pub fn with_video_url(mut self, video_url: impl Into<String>) -> Self {
        self.video_url = Some(video_url.into());
        self
    }
}

impl Default for ExtractFrameData {
    fn default() -> Self {
        Self {
            video_url: None,
            timestamp: FrameTimestamp::default(),
            label: "Extract Frame".to_owned(),
        }
    }
}

/// Calls a language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmData {
    /// Target model; unknown names resolve to the default model.
    pub model: LanguageModel,
    /// System prompt used when no edge feeds the `system_prompt` slot.
    pub system_prompt: String,
    /// User message used when no edge feeds the `user_message` slot.
    pub user_message: String,
    /// Display label.
    pub label: String,
}

impl LlmData {
    /// Creates a payload with a local user message.
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            ..Self::default()
        }
    }

    /// Sets the local system prompt.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Sets the model.
    pub fn with_model(mut self, model: LanguageModel) -> Self {
        self.model = model;
        self
    }
}

impl Default for LlmData {
    fn default() -> Self {
        Self {
            model: LanguageModel::default(),
            system_prompt: String::new(),
            user_message: String::new(),
            label: "LLM".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_clamped_on_entry() {
        assert_eq!(Percent::new(150.0), Percent::FULL);
        assert_eq!(Percent::new(-5.0), Percent::ZERO);
        assert_eq!(Percent::new(f64::NAN), Percent::ZERO);

        let data: CropImageData =
            serde_json::from_str(r#"{"xPercent": -20, "widthPercent": 250.5}"#).unwrap();
        assert_eq!(data.x_percent, Percent::ZERO);
        assert_eq!(data.width_percent, Percent::FULL);
        assert_eq!(data.height_percent, Percent::FULL);
    }

    #[test]
    fn test_missing_fields_are_defaulted() {
        let data: LlmData = serde_json::from_str("{}").unwrap();
        assert_eq!(data.model, LanguageModel::GeminiFlash);
        assert!(data.user_message.is_empty());
        assert_eq!(data.label, "LLM");

        let data: LlmData = serde_json::from_str(r#"{"model": "retired-model"}"#).unwrap();
        assert_eq!(data.model, LanguageModel::GeminiFlash);
    }

    #[test]
    fn test_frame_timestamp_parsing() {
        assert_eq!(
            FrameTimestamp::new("12.5").position().unwrap(),
            FramePosition::Seconds(12.5)
        );
        assert_eq!(
            FrameTimestamp::new(" 50% ").position().unwrap(),
            FramePosition::Percent(Percent::new(50.0))
        );
        assert_eq!(
            FrameTimestamp::default().position().unwrap(),
            FramePosition::Seconds(0.0)
        );
        assert!(FrameTimestamp::new("soon").position().is_err());
        assert!(FrameTimestamp::new("-3").position().is_err());
    }

    #[test]
    fn test_numeric_timestamp_accepted() {
        let data: ExtractFrameData = serde_json::from_str(r#"{"timestamp": 3}"#).unwrap();
        assert_eq!(data.timestamp.as_str(), "3");
    }
}
