//! Media service wrapper with observability.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use url::Url;

use super::{CropArea, ImageDimensions, MediaProvider, SeekTime};
use crate::{Result, TRACING_TARGET_MEDIA};

/// Media service wrapper with observability.
///
/// Adds structured logging to any [`MediaProvider`] implementation. The inner
/// provider is wrapped in `Arc` for cheap cloning into node tasks.
#[derive(Clone)]
pub struct MediaService {
    inner: Arc<dyn MediaProvider>,
}

impl fmt::Debug for MediaService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaService").finish_non_exhaustive()
    }
}

impl MediaService {
    /// Creates a new media service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: MediaProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Measures the pixel dimensions of an image.
    pub async fn image_dimensions(&self, image_url: &Url) -> Result<ImageDimensions> {
        let started_at = Instant::now();
        let result = self.inner.image_dimensions(image_url).await;

        match &result {
            Ok(dimensions) => tracing::debug!(
                target: TRACING_TARGET_MEDIA,
                url = %image_url,
                width = dimensions.width,
                height = dimensions.height,
                elapsed_ms = started_at.elapsed().as_millis(),
                "Measured image dimensions"
            ),
            Err(error) => tracing::warn!(
                target: TRACING_TARGET_MEDIA,
                url = %image_url,
                error = %error,
                "Image measurement failed"
            ),
        }

        result
    }

    /// Measures the duration of a video, in seconds.
    pub async fn video_duration(&self, video_url: &Url) -> Result<f64> {
        let started_at = Instant::now();
        let result = self.inner.video_duration(video_url).await;

        match &result {
            Ok(duration) => tracing::debug!(
                target: TRACING_TARGET_MEDIA,
                url = %video_url,
                duration_secs = duration,
                elapsed_ms = started_at.elapsed().as_millis(),
                "Measured video duration"
            ),
            Err(error) => tracing::warn!(
                target: TRACING_TARGET_MEDIA,
                url = %video_url,
                error = %error,
                "Video measurement failed"
            ),
        }

        result
    }

    /// Crops an image to the given area.
    pub async fn crop_image(&self, image_url: &Url, area: CropArea) -> Result<Url> {
        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET_MEDIA,
            url = %image_url,
            region = %area.pixels,
            "Cropping image"
        );

        let result = self.inner.crop_image(image_url, area).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(cropped) => tracing::debug!(
                target: TRACING_TARGET_MEDIA,
                cropped_url = %cropped,
                elapsed_ms = elapsed.as_millis(),
                "Image cropped"
            ),
            Err(error) => tracing::error!(
                target: TRACING_TARGET_MEDIA,
                url = %image_url,
                error = %error,
                elapsed_ms = elapsed.as_millis(),
                "Image crop failed"
            ),
        }

        result
    }

    /// Extracts a single frame at the given seek time.
    pub async fn extract_frame(&self, video_url: &Url, seek: SeekTime) -> Result<Url> {
        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET_MEDIA,
            url = %video_url,
            seek = %seek,
            "Extracting frame"
        );

        let result = self.inner.extract_frame(video_url, seek).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(frame) => tracing::debug!(
                target: TRACING_TARGET_MEDIA,
                frame_url = %frame,
                elapsed_ms = elapsed.as_millis(),
                "Frame extracted"
            ),
            Err(error) => tracing::error!(
                target: TRACING_TARGET_MEDIA,
                url = %video_url,
                error = %error,
                elapsed_ms = elapsed.as_millis(),
                "Frame extraction failed"
            ),
        }

        result
    }
}
