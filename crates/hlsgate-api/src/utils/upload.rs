//! Multipart helpers for the upload handler

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use futures::TryStreamExt;
use hlsgate_core::{AppError, UploadedFile};
use hlsgate_processing::UploadStager;

/// Classify a multipart read failure.
///
/// A body cut off by `RequestBodyLimitLayer` surfaces here as a stream error, so it is
/// told apart from a malformed body by the status axum assigns to it.
pub fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::UploadTooLarge
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", err.body_text()))
    }
}

/// Stage the single file part of a multipart body.
///
/// Parts without a filename are treated as text fields and skipped. A second file part
/// is rejected and the already staged file is removed.
pub async fn receive_upload(
    stager: &UploadStager,
    mut multipart: Multipart,
) -> Result<UploadedFile, AppError> {
    let mut staged: Option<UploadedFile> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                if let Some(upload) = staged.take() {
                    stager.discard(&upload).await;
                }
                return Err(multipart_error(e));
            }
        };

        let Some(original_filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        if let Some(upload) = staged.take() {
            stager.discard(&upload).await;
            return Err(AppError::InvalidInput(
                "Multiple file fields are not allowed; send exactly one file".to_string(),
            ));
        }

        let field_name = field.name().unwrap_or("file").to_string();
        let content_type = field.content_type().map(str::to_string);

        let upload = stager
            .stage(
                &field_name,
                &original_filename,
                content_type.as_deref(),
                field.map_err(multipart_error),
            )
            .await?;
        tracing::info!(
            staged_file = %upload.file_name,
            original_filename = %upload.original_filename,
            size_bytes = upload.size_bytes,
            "Upload staged"
        );
        staged = Some(upload);
    }

    staged.ok_or(AppError::MissingUpload)
}
