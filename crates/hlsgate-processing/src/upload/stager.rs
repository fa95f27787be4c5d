//! Writes incoming upload streams to the staging directory.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use hlsgate_core::{AppError, UploadedFile};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const MAX_FIELD_NAME_LENGTH: usize = 64;
const MAX_EXTENSION_LENGTH: usize = 16;

/// Map a client field name to `[A-Za-z0-9_-]`, falling back to `file`.
pub fn sanitize_field_name(field_name: &str) -> String {
    let sanitized: String = field_name
        .chars()
        .take(MAX_FIELD_NAME_LENGTH)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches('_').is_empty() {
        return "file".to_string();
    }

    sanitized
}

/// Extension of the client filename, if it is 1-16 ASCII alphanumerics.
///
/// The extension is trusted as-is otherwise: it is not checked against the content.
pub fn sanitize_extension(original_filename: &str) -> Option<String> {
    let file_name = original_filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_filename);
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty()
        || extension.is_empty()
        || extension.len() > MAX_EXTENSION_LENGTH
        || !extension.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(extension.to_string())
}

/// Writes uploads under collision-free generated names.
#[derive(Debug, Clone)]
pub struct UploadStager {
    dir: PathBuf,
}

impl UploadStager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<field-name>-<generated-id>[.<ext>]`
    pub fn generate_file_name(field_name: &str, original_filename: &str) -> String {
        let field_name = sanitize_field_name(field_name);
        let id = Uuid::new_v4();
        match sanitize_extension(original_filename) {
            Some(extension) => format!("{}-{}.{}", field_name, id, extension),
            None => format!("{}-{}", field_name, id),
        }
    }

    /// Stream one file part to disk.
    ///
    /// The staging directory is created if absent. A partially written file is removed
    /// when the stream fails, and the stream's own error is returned.
    #[tracing::instrument(skip(self, stream), fields(staged_file = tracing::field::Empty))]
    pub async fn stage<S>(
        &self,
        field_name: &str,
        original_filename: &str,
        content_type: Option<&str>,
        stream: S,
    ) -> Result<UploadedFile, AppError>
    where
        S: Stream<Item = Result<Bytes, AppError>>,
    {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            tracing::error!(error = %e, dir = %self.dir.display(), "Failed to create staging directory");
            AppError::staging(&e)
        })?;

        let file_name = Self::generate_file_name(field_name, original_filename);
        let staging_path = self.dir.join(&file_name);
        tracing::Span::current().record("staged_file", file_name.as_str());

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&staging_path)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, path = %staging_path.display(), "Failed to create staging file");
                AppError::staging(&e)
            })?;

        let mut size_bytes: u64 = 0;
        let result = async {
            tokio::pin!(stream);
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk)
                    .await
                    .map_err(|e| AppError::staging(&e))?;
                size_bytes += chunk.len() as u64;
            }
            file.flush().await.map_err(|e| AppError::staging(&e))?;
            file.sync_all().await.map_err(|e| AppError::staging(&e))?;
            Ok::<(), AppError>(())
        }
        .await;

        if let Err(err) = result {
            drop(file);
            if let Err(cleanup_err) = fs::remove_file(&staging_path).await {
                tracing::debug!(
                    error = %cleanup_err,
                    path = %staging_path.display(),
                    "Failed to remove partial staging file"
                );
            }
            return Err(err);
        }

        tracing::debug!(size_bytes, path = %staging_path.display(), "Upload staged");

        Ok(UploadedFile {
            staging_path,
            file_name,
            field_name: field_name.to_string(),
            original_filename: original_filename.to_string(),
            original_extension: sanitize_extension(original_filename),
            content_type: content_type.map(String::from),
            size_bytes,
        })
    }

    /// Remove a staged file that will not be transcoded.
    pub async fn discard(&self, upload: &UploadedFile) {
        if let Err(e) = fs::remove_file(&upload.staging_path).await {
            tracing::debug!(
                error = %e,
                path = %upload.staging_path.display(),
                "Failed to discard staged upload"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::collections::HashSet;

    fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = Result<Bytes, AppError>> {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::from_static(p)))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_sanitize_field_name_strips_separators() {
        assert_eq!(sanitize_field_name("file"), "file");
        assert_eq!(sanitize_field_name("video_upload-1"), "video_upload-1");
        assert_eq!(sanitize_field_name("../../etc"), "______etc");
        assert_eq!(sanitize_field_name("a/b"), "a_b");
        assert_eq!(sanitize_field_name(""), "file");
        assert_eq!(sanitize_field_name("///"), "file");
    }

    #[test]
    fn test_sanitize_extension_keeps_client_extension() {
        assert_eq!(sanitize_extension("lesson.mp4").as_deref(), Some("mp4"));
        assert_eq!(sanitize_extension("archive.tar.MKV").as_deref(), Some("MKV"));
        assert_eq!(sanitize_extension("C:\\clips\\intro.mov").as_deref(), Some("mov"));
        assert_eq!(sanitize_extension("noext"), None);
        assert_eq!(sanitize_extension(".hidden"), None);
        assert_eq!(sanitize_extension("evil.mp4/../x"), None);
        assert_eq!(sanitize_extension("clip.mp 4"), None);
    }

    #[test]
    fn test_generated_names_follow_pattern() {
        let name = UploadStager::generate_file_name("file", "lesson.mp4");
        assert!(name.starts_with("file-"));
        assert!(name.ends_with(".mp4"));
        let id = &name["file-".len()..name.len() - ".mp4".len()];
        assert!(Uuid::parse_str(id).is_ok());

        let no_ext = UploadStager::generate_file_name("file", "lesson");
        assert!(!no_ext.contains('.'));
    }

    #[tokio::test]
    async fn test_stage_writes_all_chunks() {
        let temp = tempfile::tempdir().expect("tempdir");
        let stager = UploadStager::new(temp.path().join("uploads"));

        let upload = stager
            .stage(
                "file",
                "lesson.mp4",
                Some("video/mp4"),
                chunks(&[b"abc", b"def", b"gh"]),
            )
            .await
            .expect("stage");

        assert_eq!(upload.size_bytes, 8);
        assert_eq!(upload.original_extension.as_deref(), Some("mp4"));
        assert_eq!(upload.content_type.as_deref(), Some("video/mp4"));
        assert_eq!(upload.staging_path.parent(), Some(stager.dir()));
        let written = tokio::fs::read(&upload.staging_path).await.expect("read");
        assert_eq!(written, b"abcdefgh");
    }

    #[tokio::test]
    async fn test_identical_names_never_collide() {
        let temp = tempfile::tempdir().expect("tempdir");
        let stager = UploadStager::new(temp.path());

        let mut names = HashSet::new();
        for _ in 0..50 {
            let upload = stager
                .stage("file", "same.mp4", None, chunks(&[b"x"]))
                .await
                .expect("stage");
            names.insert(upload.file_name);
        }
        assert_eq!(names.len(), 50);

        let mut entries = tokio::fs::read_dir(temp.path()).await.expect("read_dir");
        let mut count = 0;
        while entries.next_entry().await.expect("entry").is_some() {
            count += 1;
        }
        assert_eq!(count, 50);
    }

    async fn assert_empty(dir: &Path) {
        let mut entries = tokio::fs::read_dir(dir).await.expect("read_dir");
        assert!(entries.next_entry().await.expect("entry").is_none());
    }

    #[tokio::test]
    async fn test_failed_stream_leaves_no_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let stager = UploadStager::new(temp.path());

        let failing = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(AppError::InvalidInput("client went away".to_string())),
        ]);

        let err = stager
            .stage("file", "clip.mp4", None, failing)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(ref msg) if msg == "client went away"));
        assert_empty(temp.path()).await;
    }

    #[tokio::test]
    async fn test_size_limit_error_is_returned_unchanged() {
        let temp = tempfile::tempdir().expect("tempdir");
        let stager = UploadStager::new(temp.path());

        let over_limit = stream::iter(vec![
            Ok(Bytes::from_static(b"first chunk")),
            Err(AppError::UploadTooLarge),
        ]);

        let err = stager
            .stage("file", "big.mp4", None, over_limit)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UploadTooLarge));
        assert_empty(temp.path()).await;
    }

    #[tokio::test]
    async fn test_discard_removes_staged_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let stager = UploadStager::new(temp.path());
        let upload = stager
            .stage("file", "clip.mp4", None, chunks(&[b"data"]))
            .await
            .expect("stage");

        stager.discard(&upload).await;
        assert!(!upload.staging_path.exists());
    }
}
