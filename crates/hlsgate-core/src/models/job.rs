use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use super::layout::UploadsLayout;
use super::upload::UploadedFile;

/// Identifier of one transcode job.
///
/// Rendered as a hyphenated UUID, so it is safe to use as a directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Mint a fresh identifier. Never fails.
    pub fn generate() -> Self {
        JobId(Uuid::new_v4())
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// One upload-to-HLS transcoding task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeJob {
    pub id: JobId,
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub playlist_path: PathBuf,
}

impl TranscodeJob {
    /// Allocate a new job id for a staged upload and derive its output locations.
    ///
    /// Does not touch the filesystem.
    pub fn allocate(layout: &UploadsLayout, upload: &UploadedFile) -> Self {
        let id = JobId::generate();
        TranscodeJob {
            id,
            input_path: upload.staging_path.clone(),
            output_dir: layout.job_dir(&id),
            playlist_path: layout.playlist_path(&id),
        }
    }
}

/// Outcome of a successful job, after the artifact tree was verified.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeReport {
    pub job_id: JobId,
    pub playlist_path: PathBuf,
    /// Segment file names in playback order, as referenced by the playlist.
    pub segments: Vec<String>,
    pub elapsed: Duration,
}
