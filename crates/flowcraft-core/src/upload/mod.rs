//! File uploads to the public media host.

mod service;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
pub use service::UploadService;
use url::Url;

use crate::{Error, Result};

/// Maximum image upload size: 10 MB.
pub const MAX_IMAGE_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum video upload size: 500 MB.
pub const MAX_VIDEO_SIZE: u64 = 500 * 1024 * 1024;

/// A file to upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Original file name.
    pub file_name: String,
    /// MIME type of the content.
    pub content_type: String,
    /// File content.
    pub content: Bytes,
}

impl UploadFile {
    /// Creates a new upload file.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }

    /// Returns the content size in bytes.
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Accepted MIME types and size limit for an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPolicy {
    /// Accepted MIME types.
    pub accepted_types: Vec<String>,
    /// Maximum content size in bytes.
    pub max_size_bytes: u64,
}

impl UploadPolicy {
    /// Creates a policy from accepted types and a size limit.
    pub fn new<I, S>(accepted_types: I, max_size_bytes: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepted_types: accepted_types.into_iter().map(Into::into).collect(),
            max_size_bytes,
        }
    }

    /// Policy for image upload nodes.
    pub fn image() -> Self {
        Self::new(
            ["image/jpeg", "image/jpg", "image/png", "image/webp", "image/gif"],
            MAX_IMAGE_SIZE,
        )
    }

    /// Policy for video upload nodes.
    pub fn video() -> Self {
        Self::new(
            ["video/mp4", "video/quicktime", "video/webm", "video/x-m4v"],
            MAX_VIDEO_SIZE,
        )
    }

    /// Checks a file against this policy.
    pub fn check(&self, file: &UploadFile) -> Result<()> {
        let content_type = file.content_type.to_ascii_lowercase();
        if !self.accepted_types.iter().any(|t| *t == content_type) {
            return Err(Error::invalid_input().with_message(format!(
                "invalid file type {}, accepted types: {}",
                file.content_type,
                self.accepted_types.join(", ")
            )));
        }

        if file.size() > self.max_size_bytes {
            return Err(Error::invalid_input().with_message(format!(
                "file size {} exceeds the {} byte limit",
                file.size(),
                self.max_size_bytes
            )));
        }

        Ok(())
    }
}

/// Contract for the upload transport.
#[async_trait::async_trait]
pub trait UploadProvider: Send + Sync {
    /// Uploads the file and returns its public URL.
    async fn upload(&self, file: &UploadFile) -> Result<Url>;
}
