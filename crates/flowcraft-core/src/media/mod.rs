//! Media probing and processing.
//!
//! The [`MediaProvider`] trait is the contract for the remote media backend:
//! it measures images and videos and produces derived artifacts (cropped images,
//! extracted frames) that are published under a new public URL.

mod service;

use std::fmt;

use serde::{Deserialize, Serialize};
pub use service::MediaService;
use url::Url;

use crate::Result;

/// Pixel dimensions of a measured image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageDimensions {
    /// Creates new image dimensions.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns whether either side is zero.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A crop rectangle in absolute pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left offset in pixels.
    pub x: u32,
    /// Top offset in pixels.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRect {
    /// Converts a percentage region into pixels, rounding to the nearest pixel.
    ///
    /// Percentages are expected in `[0, 100]`.
    pub fn from_percent(
        dimensions: ImageDimensions,
        x_percent: f64,
        y_percent: f64,
        width_percent: f64,
        height_percent: f64,
    ) -> Self {
        let scale = |percent: f64, side: u32| ((percent / 100.0) * f64::from(side)).round() as u32;

        Self {
            x: scale(x_percent, dimensions.width),
            y: scale(y_percent, dimensions.height),
            width: scale(width_percent, dimensions.width),
            height: scale(height_percent, dimensions.height),
        }
    }

    /// Shrinks the rectangle so it lies inside the image.
    pub fn clamp_to(self, dimensions: ImageDimensions) -> Self {
        let x = self.x.min(dimensions.width);
        let y = self.y.min(dimensions.height);

        Self {
            x,
            y,
            width: self.width.min(dimensions.width - x),
            height: self.height.min(dimensions.height - y),
        }
    }

    /// Returns whether the rectangle covers no pixels.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for PixelRect {
    /// Formats as `width:height:x:y`, the order media filters expect.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.width, self.height, self.x, self.y)
    }
}

/// A crop region in percent of the image size.
///
/// Serializes with the `xPercent`/`yPercent`/`widthPercent`/`heightPercent`
/// field names used by the crop route.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentRect {
    /// Left offset.
    pub x_percent: f64,
    /// Top offset.
    pub y_percent: f64,
    /// Region width.
    pub width_percent: f64,
    /// Region height.
    pub height_percent: f64,
}

impl PercentRect {
    /// Creates a percentage region.
    pub const fn new(
        x_percent: f64,
        y_percent: f64,
        width_percent: f64,
        height_percent: f64,
    ) -> Self {
        Self {
            x_percent,
            y_percent,
            width_percent,
            height_percent,
        }
    }

    /// Converts to pixels of the given image, clamped to its bounds.
    pub fn to_pixels(&self, dimensions: ImageDimensions) -> PixelRect {
        PixelRect::from_percent(
            dimensions,
            self.x_percent,
            self.y_percent,
            self.width_percent,
            self.height_percent,
        )
        .clamp_to(dimensions)
    }
}

/// A crop resolved against a measured image.
///
/// Carries both forms so a backend can use whichever it accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropArea {
    /// Region as entered on the node.
    pub region: PercentRect,
    /// Region in absolute pixels.
    pub pixels: PixelRect,
}

impl CropArea {
    /// Resolves a percentage region against the image dimensions.
    pub fn resolve(region: PercentRect, dimensions: ImageDimensions) -> Self {
        Self {
            region,
            pixels: region.to_pixels(dimensions),
        }
    }
}

/// Absolute seek position inside a video, in seconds.
///
/// Displays with two decimals, which is the precision passed to the frame
/// extractor.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeekTime(f64);

impl SeekTime {
    /// Creates a seek time from seconds.
    pub const fn from_secs(seconds: f64) -> Self {
        Self(seconds)
    }

    /// Resolves a percentage of the total duration to an absolute seek time.
    pub fn from_percent(percent: f64, duration_secs: f64) -> Self {
        Self(duration_secs * percent / 100.0)
    }

    /// Returns the seek time in seconds.
    pub const fn as_secs(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for SeekTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Contract for the remote media backend.
#[async_trait::async_trait]
pub trait MediaProvider: Send + Sync {
    /// Measures the pixel dimensions of the image at `image_url`.
    async fn image_dimensions(&self, image_url: &Url) -> Result<ImageDimensions>;

    /// Measures the total duration of the video at `video_url`, in seconds.
    async fn video_duration(&self, video_url: &Url) -> Result<f64>;

    /// Crops the image and returns the public URL of the result.
    async fn crop_image(&self, image_url: &Url, area: CropArea) -> Result<Url>;

    /// Extracts a single frame and returns the public URL of the result.
    async fn extract_frame(&self, video_url: &Url, seek: SeekTime) -> Result<Url>;
}
