pub mod artifact;
pub mod command;
pub mod lifecycle;
pub mod progress;
pub mod runner;
pub mod service;

#[cfg(all(test, unix))]
mod test_support;

pub use artifact::{parse_playlist_segments, ArtifactTree};
pub use command::HlsCommand;
pub use lifecycle::{FailureReason, InvalidTransition, JobState, LifecycleObserver, TranscodeEvent};
pub use progress::ProgressTracker;
pub use runner::FfmpegRunner;
pub use service::{TranscodeHandle, TranscodeService, TranscodeServiceConfig};
