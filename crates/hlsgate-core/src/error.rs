//! Error types module
//!
//! All pipeline failures are unified under the `AppError` enum. Each variant describes
//! its own HTTP presentation through the `ErrorMetadata` trait so the API layer can
//! render it without matching on variants.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like a request without a file
    Debug,
    /// Warning level - for recoverable issues like a timed out job
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "TRANSCODE_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Short client-facing summary
    fn client_message(&self) -> String;

    /// Underlying message safe to show to the client
    fn client_details(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No file uploaded")]
    MissingUpload,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upload exceeds the size limit")]
    UploadTooLarge,

    /// Carries the OS error description only, never the staging path.
    #[error("Failed to stage upload: {0}")]
    StagingIo(String),

    #[error("Failed to create output directory: {0}")]
    OutputDirectory(String),

    /// Carries the transcoder's own message verbatim.
    #[error("{message}")]
    TranscodeFailure { message: String },

    #[error("Transcode timed out after {seconds}s")]
    TranscodeTimeout { seconds: u64 },

    #[error("Incomplete artifact tree: {0}")]
    ArtifactIncomplete(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn staging(err: &io::Error) -> Self {
        AppError::StagingIo(err.kind().to_string())
    }

    pub fn output_directory(err: &io::Error) -> Self {
        AppError::OutputDirectory(err.kind().to_string())
    }

    pub fn transcode(message: impl Into<String>) -> Self {
        AppError::TranscodeFailure {
            message: message.into(),
        }
    }

    /// Get the error type name for logs
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::MissingUpload => "MissingUpload",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::UploadTooLarge => "UploadTooLarge",
            AppError::StagingIo(_) => "StagingIO",
            AppError::OutputDirectory(_) => "OutputDirectory",
            AppError::TranscodeFailure { .. } => "TranscodeFailure",
            AppError::TranscodeTimeout { .. } => "TranscodeTimeout",
            AppError::ArtifactIncomplete(_) => "ArtifactIncomplete",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, log_level).
///
/// Every failure of an upload request is a 500. The only exception is the body size
/// cap, which keeps the 413 that `RequestBodyLimitLayer` answers with up front.
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::MissingUpload => (500, "MISSING_UPLOAD", false, LogLevel::Debug),
        AppError::InvalidInput(_) => (500, "INVALID_INPUT", false, LogLevel::Debug),
        AppError::UploadTooLarge => (413, "UPLOAD_TOO_LARGE", false, LogLevel::Debug),
        AppError::StagingIo(_) => (500, "STAGING_IO_ERROR", true, LogLevel::Error),
        AppError::OutputDirectory(_) => (500, "OUTPUT_DIRECTORY_ERROR", true, LogLevel::Error),
        AppError::TranscodeFailure { .. } => (500, "TRANSCODE_FAILED", false, LogLevel::Error),
        AppError::TranscodeTimeout { .. } => (500, "TRANSCODE_TIMEOUT", true, LogLevel::Warn),
        AppError::ArtifactIncomplete(_) => (500, "ARTIFACT_INCOMPLETE", false, LogLevel::Error),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => {
            (500, "INTERNAL_ERROR", true, LogLevel::Error)
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::MissingUpload => "No file uploaded".to_string(),
            AppError::InvalidInput(_) => "Invalid upload request".to_string(),
            AppError::UploadTooLarge => "Upload too large".to_string(),
            AppError::StagingIo(_) => "Failed to store upload".to_string(),
            AppError::OutputDirectory(_) => "Failed to prepare output directory".to_string(),
            AppError::TranscodeFailure { .. } | AppError::ArtifactIncomplete(_) => {
                "Failed to process video".to_string()
            }
            AppError::TranscodeTimeout { .. } => "Video processing timed out".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }

    fn client_details(&self) -> String {
        match self {
            AppError::MissingUpload => "Request must contain exactly one file field".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::UploadTooLarge => {
                "Request body exceeds the configured upload size limit".to_string()
            }
            AppError::StagingIo(ref kind) | AppError::OutputDirectory(ref kind) => kind.clone(),
            AppError::TranscodeFailure { ref message } => message.clone(),
            AppError::TranscodeTimeout { .. } => self.to_string(),
            AppError::ArtifactIncomplete(ref msg) => msg.clone(),
            // Internal messages may carry paths or driver state
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "An unexpected error occurred".to_string()
            }
        }
    }
}
