//! Test helpers: build AppState and router for integration tests.
//!
//! Pipeline tests run against scripted stand-ins for ffmpeg, so only the end-to-end
//! tests need a real encoder.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum::Router;
use axum_test::TestServer;
use hlsgate_api::setup::routes;
use hlsgate_api::state::AppState;
use hlsgate_core::Config;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tempfile::TempDir;

/// Writes a playlist and three non-empty segments next to the output playlist.
pub const FAKE_SUCCESS: &str = "success";
/// Fails like ffmpeg does on unreadable input.
pub const FAKE_FAILURE: &str = "failure";

const SCRIPT_SOURCES: [(&str, &str); 2] = [
    (
        FAKE_SUCCESS,
        include_str!("../../../../testdata/fake-ffmpeg/success.sh"),
    ),
    (
        FAKE_FAILURE,
        include_str!("../../../../testdata/fake-ffmpeg/failure.sh"),
    ),
];

/// All scripts are written before any test can spawn one.
fn scripts() -> &'static TempDir {
    static SCRIPTS: OnceLock<TempDir> = OnceLock::new();
    SCRIPTS.get_or_init(|| {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("Failed to create script directory");
        for (name, body) in SCRIPT_SOURCES {
            let path = dir.path().join(name);
            std::fs::write(&path, body).expect("Failed to write fake ffmpeg");
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .expect("Failed to chmod fake ffmpeg");
        }
        dir
    })
}

pub fn fake_ffmpeg(name: &str) -> String {
    scripts().path().join(name).to_string_lossy().to_string()
}

/// Test application: server plus the temporary uploads root it writes into.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub config: Config,
    pub uploads: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// A fresh router over the same state, for requests `TestServer` cannot express.
    pub fn router(&self) -> Router {
        routes::setup_routes(&self.config, self.state.clone()).expect("Failed to build router")
    }

    pub fn uploads_root(&self) -> &Path {
        self.uploads.path()
    }

    pub fn courses_dir(&self) -> PathBuf {
        self.uploads.path().join("courses")
    }

    /// Files directly under the uploads root (staged uploads).
    pub fn staged_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.uploads.path())
            .expect("Failed to read uploads root")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

/// Setup a test app whose transcoder runs `ffmpeg_path`.
pub fn setup_test_app(ffmpeg_path: &str) -> TestApp {
    setup_test_app_with(ffmpeg_path, &[])
}

/// Setup a test app with extra environment overrides.
pub fn setup_test_app_with(ffmpeg_path: &str, overrides: &[(&'static str, &str)]) -> TestApp {
    let uploads = tempfile::tempdir().expect("Failed to create temp directory");
    let config = create_test_config(uploads.path(), ffmpeg_path, overrides);

    let state = Arc::new(AppState::new(config.clone()));
    let app = routes::setup_routes(&config, state.clone()).expect("Failed to build router");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        config,
        uploads,
    }
}

pub fn create_test_config(
    uploads_dir: &Path,
    ffmpeg_path: &str,
    overrides: &[(&'static str, &str)],
) -> Config {
    let mut vars: HashMap<&str, String> = HashMap::from([
        ("UPLOADS_DIR", uploads_dir.to_string_lossy().to_string()),
        ("FFMPEG_PATH", ffmpeg_path.to_string()),
        ("MAX_CONCURRENT_TRANSCODES", "2".to_string()),
        ("TRANSCODE_TIMEOUT_SECS", "120".to_string()),
        ("MAX_UPLOAD_SIZE_MB", "64".to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert(*key, value.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).expect("Failed to build test config")
}

pub fn video_form(filename: &str, data: Vec<u8>) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(data))
        .file_name(filename.to_string())
        .mime_type("video/mp4");
    MultipartForm::new().add_part("file", part)
}
