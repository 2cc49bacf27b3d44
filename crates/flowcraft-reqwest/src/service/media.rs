//! Media backend over HTTP.

use flowcraft_core::{CropArea, ImageDimensions, MediaProvider, PercentRect, Result, SeekTime};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::connect::{ReqwestClient, TRACING_TARGET};

/// Measures image dimensions.
///
/// Served by the flowcraft media worker; the workflow app itself measures
/// media inside its crop and frame routes.
pub const IMAGE_DIMENSIONS_PATH: &str = "api/media/image-dimensions";
/// Measures video duration. Served by the flowcraft media worker.
pub const VIDEO_DURATION_PATH: &str = "api/media/video-duration";
/// Crops an image.
pub const CROP_IMAGE_PATH: &str = "api/trigger/crop-image";
/// Extracts a video frame.
pub const EXTRACT_FRAME_PATH: &str = "api/trigger/extract-frame";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageRequest<'a> {
    image_url: &'a Url,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoRequest<'a> {
    video_url: &'a Url,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DurationResponse {
    duration_secs: f64,
}

/// Crop route body.
///
/// The route reads the percent fields and rounds against its own measurement;
/// the resolved pixels ride along for backends that take them directly.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CropRequest<'a> {
    image_url: &'a Url,
    #[serde(flatten)]
    region: PercentRect,
    crop_x: u32,
    crop_y: u32,
    crop_w: u32,
    crop_h: u32,
}

impl<'a> CropRequest<'a> {
    fn new(image_url: &'a Url, area: CropArea) -> Self {
        Self {
            image_url,
            region: area.region,
            crop_x: area.pixels.x,
            crop_y: area.pixels.y,
            crop_w: area.pixels.width,
            crop_h: area.pixels.height,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CropResponse {
    cropped_image_url: Url,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FrameRequest<'a> {
    video_url: &'a Url,
    /// Seconds with two decimals.
    timestamp: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrameResponse {
    extracted_frame_url: Url,
}

#[async_trait::async_trait]
impl MediaProvider for ReqwestClient {
    async fn image_dimensions(&self, image_url: &Url) -> Result<ImageDimensions> {
        let url = self.endpoint(IMAGE_DIMENSIONS_PATH)?;
        let dimensions: ImageDimensions = self.post_json(url, &ImageRequest { image_url }).await?;
        Ok(dimensions)
    }

    async fn video_duration(&self, video_url: &Url) -> Result<f64> {
        let url = self.endpoint(VIDEO_DURATION_PATH)?;
        let response: DurationResponse = self.post_json(url, &VideoRequest { video_url }).await?;
        Ok(response.duration_secs)
    }

    async fn crop_image(&self, image_url: &Url, area: CropArea) -> Result<Url> {
        tracing::debug!(
            target: TRACING_TARGET,
            image_url = %image_url,
            region = %area.pixels,
            "Requesting crop"
        );

        let url = self.endpoint(CROP_IMAGE_PATH)?;
        let request = CropRequest::new(image_url, area);
        let response: CropResponse = self.post_json(url, &request).await?;
        Ok(response.cropped_image_url)
    }

    async fn extract_frame(&self, video_url: &Url, seek: SeekTime) -> Result<Url> {
        tracing::debug!(
            target: TRACING_TARGET,
            video_url = %video_url,
            seek = %seek,
            "Requesting frame extraction"
        );

        let url = self.endpoint(EXTRACT_FRAME_PATH)?;
        let request = FrameRequest {
            video_url,
            timestamp: seek.to_string(),
        };
        let response: FrameResponse = self.post_json(url, &request).await?;
        Ok(response.extracted_frame_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_request_shape() {
        let image_url = Url::parse("https://cdn.test/a.png").unwrap();
        let area = CropArea::resolve(
            PercentRect::new(10.0, 10.0, 50.0, 50.0),
            ImageDimensions::new(200, 100),
        );
        let json = serde_json::to_value(CropRequest::new(&image_url, area)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "imageUrl": "https://cdn.test/a.png",
                "xPercent": 10.0,
                "yPercent": 10.0,
                "widthPercent": 50.0,
                "heightPercent": 50.0,
                "cropX": 20,
                "cropY": 10,
                "cropW": 100,
                "cropH": 50,
            })
        );
    }

    #[test]
    fn test_frame_request_uses_two_decimals() {
        let video_url = Url::parse("https://cdn.test/v.mp4").unwrap();
        let json = serde_json::to_value(FrameRequest {
            video_url: &video_url,
            timestamp: SeekTime::from_percent(50.0, 7.0).to_string(),
        })
        .unwrap();
        assert_eq!(json["timestamp"], "3.50");
    }

    #[test]
    fn test_frame_response_decodes() {
        let response: FrameResponse = crate::connect::decode(
            br#"{"success":true,"extractedFrameUrl":"https://cdn.test/f.jpg"}"#,
        )
        .unwrap();
        assert_eq!(response.extracted_frame_url.as_str(), "https://cdn.test/f.jpg");
    }
}
