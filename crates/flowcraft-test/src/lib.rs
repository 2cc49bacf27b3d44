#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod mock;

pub use mock::{
    ECHO_PREFIX, MockLanguageConfig, MockLanguageProvider, MockMediaConfig, MockMediaProvider,
    MockUploadConfig, MockUploadProvider, create_mock_language_service,
    create_mock_media_service, create_mock_upload_service,
};
