pub mod job;
pub mod layout;
pub mod response;
pub mod upload;

pub use job::{JobId, TranscodeJob, TranscodeReport};
pub use layout::{
    segment_file_name, UploadsLayout, COURSES_DIR, PLAYLIST_FILE_NAME, PUBLIC_UPLOADS_PREFIX,
    SEGMENT_FILE_PATTERN,
};
pub use response::{HealthResponse, MessageResponse, UploadResponse};
pub use upload::UploadedFile;
