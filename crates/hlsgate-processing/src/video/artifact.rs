use hlsgate_core::models::segment_file_name;
use hlsgate_core::{AppError, PLAYLIST_FILE_NAME};
use std::io;
use std::path::{Path, PathBuf};

/// Verified output of one job: a playlist and the segments it references, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactTree {
    pub playlist_path: PathBuf,
    pub segments: Vec<String>,
}

impl ArtifactTree {
    /// Check the job directory after ffmpeg reported success.
    ///
    /// The playlist must exist, be an M3U playlist and reference a contiguous
    /// `segment000.ts, segment001.ts, ...` sequence of non-empty files in the same
    /// directory.
    pub async fn inspect(output_dir: &Path) -> Result<Self, AppError> {
        let playlist_path = output_dir.join(PLAYLIST_FILE_NAME);
        let contents = match tokio::fs::read_to_string(&playlist_path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(AppError::ArtifactIncomplete(format!(
                    "{} was not produced",
                    PLAYLIST_FILE_NAME
                )));
            }
            Err(e) => {
                return Err(AppError::ArtifactIncomplete(format!(
                    "{} is unreadable: {}",
                    PLAYLIST_FILE_NAME,
                    e.kind()
                )));
            }
        };

        if !contents.trim_start().starts_with("#EXTM3U") {
            return Err(AppError::ArtifactIncomplete(format!(
                "{} is not an HLS playlist",
                PLAYLIST_FILE_NAME
            )));
        }

        let segments = parse_playlist_segments(&contents);
        if segments.is_empty() {
            return Err(AppError::ArtifactIncomplete(
                "playlist references no segments".to_string(),
            ));
        }

        for (index, segment) in segments.iter().enumerate() {
            let expected = segment_file_name(index);
            if *segment != expected {
                return Err(AppError::ArtifactIncomplete(format!(
                    "segment {} is {:?}, expected {:?}",
                    index, segment, expected
                )));
            }

            let size = tokio::fs::metadata(output_dir.join(segment))
                .await
                .ok()
                .filter(|m| m.is_file())
                .map(|m| m.len());
            match size {
                None => {
                    return Err(AppError::ArtifactIncomplete(format!(
                        "segment {} is missing",
                        segment
                    )))
                }
                Some(0) => {
                    return Err(AppError::ArtifactIncomplete(format!(
                        "segment {} is empty",
                        segment
                    )))
                }
                Some(_) => {}
            }
        }

        Ok(ArtifactTree {
            playlist_path,
            segments,
        })
    }
}

/// URI lines of a media playlist, in order. Tags and blank lines are skipped.
pub fn parse_playlist_segments(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}
