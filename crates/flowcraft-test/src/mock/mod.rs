//! Mock implementations of the flowcraft providers.
//!
//! The mocks never touch the network. Media and upload mocks derive result
//! URLs from a configurable base URL; the language mock echoes its input.

mod language;
mod media;
mod upload;

use flowcraft_core::{LanguageService, MediaService, UploadService};
pub use language::{ECHO_PREFIX, MockLanguageConfig, MockLanguageProvider};
pub use media::{MockMediaConfig, MockMediaProvider};
pub use upload::{MockUploadConfig, MockUploadProvider};

/// Creates a mock media service with default configuration.
pub fn create_mock_media_service() -> MediaService {
    MediaService::new(MockMediaProvider::default())
}

/// Creates a mock language service with default configuration.
pub fn create_mock_language_service() -> LanguageService {
    LanguageService::new(MockLanguageProvider::default())
}

/// Creates a mock upload service with default configuration.
pub fn create_mock_upload_service() -> UploadService {
    UploadService::new(MockUploadProvider::default())
}
