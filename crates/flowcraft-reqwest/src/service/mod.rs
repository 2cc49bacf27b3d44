//! Collaborator contract implementations for [`ReqwestClient`].
//!
//! Every endpoint speaks JSON over the workflow API; uploads are sent as
//! multipart forms.
//!
//! [`ReqwestClient`]: crate::ReqwestClient

mod language;
mod media;
mod store;
mod upload;

pub use language::EXECUTE_LLM_PATH;
pub use media::{CROP_IMAGE_PATH, EXTRACT_FRAME_PATH, IMAGE_DIMENSIONS_PATH, VIDEO_DURATION_PATH};
pub use store::{COMPLETE_RUN_PATH, CREATE_RUN_PATH, UPDATE_NODE_PATH, WORKFLOWS_PATH};
pub use upload::{UPLOAD_IMAGE_PATH, UPLOAD_VIDEO_PATH};
