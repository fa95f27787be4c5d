//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>`; anything that converts into `AppError`
//! renders with the same status, body shape and logging.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hlsgate_core::{AppError, ErrorMetadata, LogLevel};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Short summary of what failed
    pub error: String,
    /// Underlying message, with paths and internals stripped
    pub details: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        ErrorResponse {
            error: err.client_message(),
            details: err.client_details(),
            code: err.error_code().to_string(),
        }
    }
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from hlsgate-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type, code, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type, code, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type, code, "Request failed");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        (status, Json(ErrorResponse::from(app_error))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = HttpAppError(err).into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&body).expect("json"))
    }

    #[tokio::test]
    async fn test_missing_upload_is_server_error() {
        let (status, body) = render(AppError::MissingUpload).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "No file uploaded");
        assert!(body["details"].is_string());
        assert_eq!(body["code"], "MISSING_UPLOAD");
    }

    #[tokio::test]
    async fn test_invalid_input_carries_details() {
        let (status, body) = render(AppError::InvalidInput(
            "Multiple file fields are not allowed".to_string(),
        ))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Invalid upload request");
        assert_eq!(body["details"], "Multiple file fields are not allowed");
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_transcode_failure_body() {
        let message = "ffmpeg exited with code 1: moov atom not found";
        let (status, body) = render(AppError::transcode(message)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to process video");
        assert_eq!(body["details"], message);
        assert_eq!(body["code"], "TRANSCODE_FAILED");
    }

    #[tokio::test]
    async fn test_timeout_keeps_failure_contract() {
        let (status, body) = render(AppError::TranscodeTimeout { seconds: 60 }).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Video processing timed out");
        assert_eq!(body["details"], "Transcode timed out after 60s");
        assert_eq!(body["code"], "TRANSCODE_TIMEOUT");
    }

    #[tokio::test]
    async fn test_upload_too_large_is_payload_too_large() {
        let (status, body) = render(AppError::UploadTooLarge).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["code"], "UPLOAD_TOO_LARGE");
        assert!(body["details"].is_string());
    }

    #[tokio::test]
    async fn test_internal_error_hides_message() {
        let (status, body) =
            render(HttpAppError::from(anyhow::anyhow!("secret internals")).0).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["details"], "An unexpected error occurred");
        assert!(!body.to_string().contains("secret internals"));
    }
}
