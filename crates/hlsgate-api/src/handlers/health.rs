use axum::{extract::State, Json};
use hlsgate_core::models::HealthResponse;
use std::sync::Arc;

use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/health",
    tag = "service",
    responses(
        (status = 200, description = "Service and transcoder status", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ffmpeg = if state.transcoder.ffmpeg_available() {
        "available"
    } else {
        "missing"
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        ffmpeg: ffmpeg.to_string(),
        active_transcodes: state.transcoder.active_jobs(),
        available_permits: state.transcoder.available_permits(),
    })
}
