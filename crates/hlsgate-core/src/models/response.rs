use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::job::{JobId, TranscodeReport};
use super::layout::UploadsLayout;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Response returned once a job's playlist is available.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    #[schema(value_type = String, format = Uuid)]
    pub job_id: JobId,
    /// Playlist path relative to the uploads root
    pub playlist_path: String,
    /// URL path of the playlist on the static file server
    pub playlist_url: String,
    pub segment_count: usize,
}

impl UploadResponse {
    pub fn from_report(layout: &UploadsLayout, report: &TranscodeReport) -> Self {
        UploadResponse {
            message: "Video processed successfully".to_string(),
            job_id: report.job_id,
            playlist_path: layout.relative_playlist_path(&report.job_id),
            playlist_url: layout.playlist_url(&report.job_id),
            segment_count: report.segments.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    /// "available" or "missing"
    pub ffmpeg: String,
    pub active_transcodes: usize,
    pub available_permits: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_upload_response_shape() {
        let layout = UploadsLayout::new("uploads");
        let job_id = JobId::generate();
        let report = TranscodeReport {
            job_id,
            playlist_path: layout.playlist_path(&job_id),
            segments: vec!["segment000.ts".to_string(), "segment001.ts".to_string()],
            elapsed: Duration::from_secs(3),
        };

        let response = UploadResponse::from_report(&layout, &report);
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["jobId"], job_id.to_string());
        assert_eq!(
            json["playlistUrl"],
            format!("/uploads/courses/{}/index.m3u8", job_id)
        );
        assert_eq!(
            json["playlistPath"],
            format!("courses/{}/index.m3u8", job_id)
        );
        assert_eq!(json["segmentCount"], 2);
        assert!(json.get("message").and_then(|v| v.as_str()).is_some());
    }
}
