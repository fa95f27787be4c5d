//! Upload staging and HLS transcoding pipeline.
//!
//! The pipeline is: stage the upload ([`UploadStager`]), allocate a job and its output
//! directory ([`TranscodeService::prepare`]), run ffmpeg under the concurrency cap and
//! observe its lifecycle ([`TranscodeService::submit`]), then verify the artifact tree.

pub mod upload;
pub mod video;

pub use upload::UploadStager;
pub use video::{
    ArtifactTree, FfmpegRunner, FailureReason, HlsCommand, JobState, LifecycleObserver,
    ProgressTracker, TranscodeEvent, TranscodeHandle, TranscodeService, TranscodeServiceConfig,
};
