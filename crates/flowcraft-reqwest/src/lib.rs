#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod connect;
mod error;
mod service;

pub use crate::connect::{
    DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS, ReqwestClient, ReqwestConfig, TRACING_TARGET,
};
pub use crate::error::{Error, Result};
pub use crate::service::*;
