use axum::Json;
use hlsgate_core::models::MessageResponse;

pub const GREETING: &str = "Hello from hlsgate!";

#[utoipa::path(
    get,
    path = "/",
    tag = "service",
    responses(
        (status = 200, description = "Service greeting", body = MessageResponse)
    )
)]
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: GREETING.to_string(),
    })
}
