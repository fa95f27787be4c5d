//! Scripted stand-ins for ffmpeg used by the pipeline tests.

use hlsgate_core::{JobId, TranscodeJob, UploadsLayout};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::OnceLock;
use tempfile::TempDir;

const SCRIPT_SOURCES: [(&str, &str); 4] = [
    ("success", include_str!("../../../../testdata/fake-ffmpeg/success.sh")),
    ("failure", include_str!("../../../../testdata/fake-ffmpeg/failure.sh")),
    ("hang", include_str!("../../../../testdata/fake-ffmpeg/hang.sh")),
    ("silent", include_str!("../../../../testdata/fake-ffmpeg/silent.sh")),
];

/// Written once, before any test spawns a process, so no script is ever open for
/// writing while another test forks.
fn scripts() -> &'static TempDir {
    static SCRIPTS: OnceLock<TempDir> = OnceLock::new();
    SCRIPTS.get_or_init(|| {
        let dir = tempfile::tempdir().expect("script dir");
        for (name, body) in SCRIPT_SOURCES {
            let path = dir.path().join(name);
            std::fs::write(&path, body).expect("write script");
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .expect("chmod script");
        }
        dir
    })
}

/// Path of the named fake ffmpeg: `success`, `failure`, `hang` or `silent`.
pub fn fake_ffmpeg(name: &str) -> String {
    scripts().path().join(name).to_string_lossy().to_string()
}

/// A job with a staged input and an existing output directory under `root`.
pub async fn job_in(root: &Path) -> TranscodeJob {
    let layout = UploadsLayout::new(root);
    let id = JobId::generate();
    let job = TranscodeJob {
        id,
        input_path: root.join(format!("file-{}.mp4", id)),
        output_dir: layout.job_dir(&id),
        playlist_path: layout.playlist_path(&id),
    };
    tokio::fs::write(&job.input_path, b"not really a video")
        .await
        .expect("write input");
    tokio::fs::create_dir_all(&job.output_dir)
        .await
        .expect("create output dir");
    job
}
