#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for media operations.
pub const TRACING_TARGET_MEDIA: &str = "flowcraft_core::media";

/// Tracing target for language model operations.
pub const TRACING_TARGET_LANGUAGE: &str = "flowcraft_core::language";

/// Tracing target for upload operations.
pub const TRACING_TARGET_UPLOAD: &str = "flowcraft_core::upload";

mod error;

pub mod language;
pub mod media;
pub mod upload;

pub use error::{BoxedError, Error, ErrorKind, Result};
pub use language::{
    CompletionRequest, CompletionResponse, LanguageModel, LanguageProvider, LanguageService,
};
pub use media::{
    CropArea, ImageDimensions, MediaProvider, MediaService, PercentRect, PixelRect, SeekTime,
};
pub use upload::{UploadFile, UploadPolicy, UploadProvider, UploadService};
