//! hlsgate Core Library
//!
//! This crate provides the configuration, error types and domain models shared by the
//! transcoding pipeline and the HTTP API.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{BaseConfig, Config, PipelineConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    JobId, TranscodeJob, TranscodeReport, UploadedFile, UploadsLayout, PLAYLIST_FILE_NAME,
    SEGMENT_FILE_PATTERN,
};
