//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use hlsgate_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "hlsgate API",
        version = "0.1.0",
        description = "Upload a video and receive it as an HLS playlist with transport-stream segments. Generated files are served under /uploads."
    ),
    paths(
        handlers::root::root,
        handlers::health::health,
        handlers::upload::upload_video,
    ),
    components(schemas(
        models::MessageResponse,
        models::HealthResponse,
        models::UploadResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "service", description = "Greeting and health"),
        (name = "videos", description = "Video upload and HLS conversion")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
