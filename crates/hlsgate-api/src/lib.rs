//! hlsgate API Library
//!
//! This crate provides the HTTP handlers and application setup for the upload-to-HLS
//! service.

mod api_doc;
mod handlers;
mod telemetry;
mod utils;

pub mod error;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use handlers::root::GREETING;
