//! Connection module.
//!
//! This module provides the shared HTTP client used by every provider
//! implementation in this crate.

mod client;
mod config;

pub(crate) use client::decode;
pub use client::{ReqwestClient, TRACING_TARGET};
pub use config::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS, ReqwestConfig};
