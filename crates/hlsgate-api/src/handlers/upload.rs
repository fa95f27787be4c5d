//! Video upload handler

use axum::{
    extract::{Multipart, State},
    Json,
};
use hlsgate_core::models::UploadResponse;
use std::sync::Arc;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::receive_upload;

/// Upload a video and convert it to HLS.
///
/// The response is sent once the job has finished. Dropping the connection before then
/// cancels the transcode.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video converted to HLS", body = UploadResponse),
        (status = 413, description = "Upload exceeds the size limit", body = ErrorResponse),
        (status = 500, description = "Missing or malformed upload, staging, transcoding or timeout failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let upload = receive_upload(&state.stager, multipart).await?;

    let job = state.transcoder.prepare(&upload).await?;
    let handle = state.transcoder.submit(job);
    tracing::info!(
        job_id = %handle.job_id(),
        staged_file = %upload.file_name,
        "Transcode job submitted"
    );

    let report = handle.wait().await?;

    Ok(Json(UploadResponse::from_report(state.layout(), &report)))
}
