//! Multipart uploads to the media host.

use flowcraft_core::{Error, Result, UploadFile, UploadProvider};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use crate::connect::{ReqwestClient, TRACING_TARGET};

/// Uploads an image.
pub const UPLOAD_IMAGE_PATH: &str = "api/upload-image";
/// Uploads a video.
pub const UPLOAD_VIDEO_PATH: &str = "api/upload-video";

#[derive(Deserialize)]
struct UploadResponse {
    url: Url,
}

/// Picks the upload route from the content type.
fn upload_path(content_type: &str) -> &'static str {
    if content_type.to_ascii_lowercase().starts_with("video/") {
        UPLOAD_VIDEO_PATH
    } else {
        UPLOAD_IMAGE_PATH
    }
}

#[async_trait::async_trait]
impl UploadProvider for ReqwestClient {
    async fn upload(&self, file: &UploadFile) -> Result<Url> {
        let part = Part::stream(file.content.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| {
                Error::invalid_input()
                    .with_message(format!("invalid content type {}", file.content_type))
                    .with_source(e)
            })?;

        let path = upload_path(&file.content_type);
        tracing::debug!(
            target: TRACING_TARGET,
            path,
            file_name = %file.file_name,
            size = file.size(),
            "Uploading file"
        );

        let url = self.endpoint(path)?;
        let response: UploadResponse = self.post_multipart(url, Form::new().part("file", part)).await?;
        Ok(response.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_route() {
        assert_eq!(upload_path("video/mp4"), UPLOAD_VIDEO_PATH);
        assert_eq!(upload_path("VIDEO/WEBM"), UPLOAD_VIDEO_PATH);
        assert_eq!(upload_path("image/png"), UPLOAD_IMAGE_PATH);
    }
}
