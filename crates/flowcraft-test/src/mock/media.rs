//! Mock media provider for testing.

use std::sync::{Arc, Mutex, PoisonError};

#[cfg(feature = "config")]
use clap::Args;
use flowcraft_core::{CropArea, Error, ImageDimensions, MediaProvider, PixelRect, Result, SeekTime};
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for the mock media provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct MockMediaConfig {
    /// Width reported for every measured image.
    #[cfg_attr(feature = "config", arg(long = "mock-image-width", default_value_t = 200))]
    pub image_width: u32,

    /// Height reported for every measured image.
    #[cfg_attr(feature = "config", arg(long = "mock-image-height", default_value_t = 100))]
    pub image_height: u32,

    /// Duration reported for every measured video, in seconds.
    #[cfg_attr(feature = "config", arg(long = "mock-video-duration", default_value_t = 10.0))]
    pub video_duration_secs: f64,

    /// Base URL under which derived artifacts are published.
    #[cfg_attr(
        feature = "config",
        arg(id = "mock_media_base_url", long = "mock-media-base-url", default_value = "https://media.flowcraft.test")
    )]
    pub base_url: String,

    /// Fails every operation with an external error.
    #[cfg_attr(feature = "config", arg(skip))]
    #[serde(default)]
    pub fail: bool,
}

impl Default for MockMediaConfig {
    fn default() -> Self {
        Self {
            image_width: 200,
            image_height: 100,
            video_duration_secs: 10.0,
            base_url: "https://media.flowcraft.test".to_owned(),
            fail: false,
        }
    }
}

#[derive(Debug, Default)]
struct MediaCalls {
    crops: Vec<PixelRect>,
    seeks: Vec<SeekTime>,
}

/// Mock media provider for testing.
///
/// Clones share the call log, so a test can keep one handle and pass the
/// other into a [`MediaService`](flowcraft_core::MediaService).
#[derive(Clone, Default, Debug)]
pub struct MockMediaProvider {
    config: MockMediaConfig,
    calls: Arc<Mutex<MediaCalls>>,
}

impl MockMediaProvider {
    /// Creates a new mock media provider with the given configuration.
    pub fn new(config: MockMediaConfig) -> Self {
        Self {
            config,
            calls: Arc::default(),
        }
    }

    /// Creates a provider that fails every call.
    pub fn failing() -> Self {
        Self::new(MockMediaConfig {
            fail: true,
            ..MockMediaConfig::default()
        })
    }

    /// Returns every crop region received so far.
    pub fn crops(&self) -> Vec<PixelRect> {
        self.lock().crops.clone()
    }

    /// Returns every seek time received so far.
    pub fn seeks(&self) -> Vec<SeekTime> {
        self.lock().seeks.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MediaCalls> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, operation: &str) -> Result<()> {
        if self.config.fail {
            return Err(Error::external_error().with_message(format!("mock {operation} failure")));
        }
        Ok(())
    }

    fn artifact_url(&self, path: &str) -> Result<Url> {
        let base = self.config.base_url.trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }
}

#[async_trait::async_trait]
impl MediaProvider for MockMediaProvider {
    async fn image_dimensions(&self, _image_url: &Url) -> Result<ImageDimensions> {
        self.check("measure")?;
        Ok(ImageDimensions::new(
            self.config.image_width,
            self.config.image_height,
        ))
    }

    async fn video_duration(&self, _video_url: &Url) -> Result<f64> {
        self.check("measure")?;
        Ok(self.config.video_duration_secs)
    }

    async fn crop_image(&self, _image_url: &Url, area: CropArea) -> Result<Url> {
        self.check("crop")?;
        let index = {
            let mut calls = self.lock();
            calls.crops.push(area.pixels);
            calls.crops.len()
        };
        self.artifact_url(&format!("crops/{index}.png"))
    }

    async fn extract_frame(&self, _video_url: &Url, seek: SeekTime) -> Result<Url> {
        self.check("frame extraction")?;
        let index = {
            let mut calls = self.lock();
            calls.seeks.push(seek);
            calls.seeks.len()
        };
        self.artifact_url(&format!("frames/{index}.jpg"))
    }
}

#[cfg(test)]
mod tests {
    use flowcraft_core::{MediaService, PercentRect};

    use super::*;

    #[tokio::test]
    async fn test_records_crops() {
        let mock = MockMediaProvider::default();
        let service = MediaService::new(mock.clone());
        let source = Url::parse("https://example.com/a.png").unwrap();

        let area = CropArea::resolve(
            PercentRect::new(0.0, 0.0, 50.0, 50.0),
            ImageDimensions::new(200, 100),
        );
        let url = service.crop_image(&source, area).await.unwrap();

        assert_eq!(url.as_str(), "https://media.flowcraft.test/crops/1.png");
        assert_eq!(mock.crops(), vec![area.pixels]);
    }

    #[tokio::test]
    async fn test_failing_provider() {
        let mock = MockMediaProvider::failing();
        let source = Url::parse("https://example.com/a.mp4").unwrap();
        assert!(mock.video_duration(&source).await.is_err());
        assert!(mock.seeks().is_empty());
    }
}
