//! Filesystem layout of the uploads root.
//!
//! ```text
//! uploads/
//!   <field-name>-<generated-id>.<ext>
//!   courses/
//!     <job-id>/
//!       index.m3u8
//!       segment000.ts
//! ```
//!
//! Players and the static file server depend on these names; they must not change.

use std::path::{Path, PathBuf};

use super::job::JobId;

pub const COURSES_DIR: &str = "courses";
pub const PLAYLIST_FILE_NAME: &str = "index.m3u8";
/// ffmpeg output pattern for segment files.
pub const SEGMENT_FILE_PATTERN: &str = "segment%03d.ts";
/// URL prefix the uploads root is served under.
pub const PUBLIC_UPLOADS_PREFIX: &str = "/uploads";

/// Name of the segment with the given zero-based index (`segment000.ts`).
pub fn segment_file_name(index: usize) -> String {
    format!("segment{:03}.ts", index)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadsLayout {
    root: PathBuf,
}

impl UploadsLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Staged uploads live directly under the root.
    pub fn staging_dir(&self) -> &Path {
        &self.root
    }

    pub fn courses_dir(&self) -> PathBuf {
        self.root.join(COURSES_DIR)
    }

    pub fn job_dir(&self, job_id: &JobId) -> PathBuf {
        self.courses_dir().join(job_id.to_string())
    }

    pub fn playlist_path(&self, job_id: &JobId) -> PathBuf {
        self.job_dir(job_id).join(PLAYLIST_FILE_NAME)
    }

    /// Playlist location relative to the uploads root, with `/` separators.
    pub fn relative_playlist_path(&self, job_id: &JobId) -> String {
        format!("{}/{}/{}", COURSES_DIR, job_id, PLAYLIST_FILE_NAME)
    }

    /// URL path under which the static file server exposes the playlist.
    pub fn playlist_url(&self, job_id: &JobId) -> String {
        format!(
            "{}/{}",
            PUBLIC_UPLOADS_PREFIX,
            self.relative_playlist_path(job_id)
        )
    }
}
