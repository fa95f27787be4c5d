//! TranscodeService - runs upload-to-HLS jobs under a concurrency cap.

use hlsgate_core::{
    AppError, Config, JobId, TranscodeJob, TranscodeReport, UploadedFile, UploadsLayout,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::Instrument;

use super::artifact::ArtifactTree;
use super::command::HlsCommand;
use super::lifecycle::{FailureReason, JobState, LifecycleObserver, TranscodeEvent};
use super::runner::FfmpegRunner;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct TranscodeServiceConfig {
    pub ffmpeg_path: String,
    pub segment_duration: u64,
    pub max_concurrent: usize,
    /// `None` lets a job run as long as ffmpeg does
    pub timeout: Option<Duration>,
}

impl TranscodeServiceConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path().to_string(),
            segment_duration: config.hls_segment_duration(),
            max_concurrent: config.max_concurrent_transcodes(),
            timeout: config.transcode_timeout(),
        }
    }
}

#[derive(Clone)]
pub struct TranscodeService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    layout: UploadsLayout,
    runner: FfmpegRunner,
    segment_duration: u64,
    max_concurrent: usize,
    permits: Arc<Semaphore>,
    active: AtomicUsize,
    shutdown: CancellationToken,
}

/// Counts a job as active from permit acquisition until it finishes.
struct ActiveJob<'a>(&'a AtomicUsize);

impl<'a> ActiveJob<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        ActiveJob(counter)
    }
}

impl Drop for ActiveJob<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TranscodeService {
    pub fn new(layout: UploadsLayout, config: TranscodeServiceConfig) -> Self {
        let max_concurrent = config.max_concurrent.max(1);
        let runner = FfmpegRunner::new(config.ffmpeg_path).with_timeout(config.timeout);

        tracing::info!(
            ffmpeg = runner.ffmpeg_path(),
            segment_duration = config.segment_duration,
            max_concurrent = max_concurrent,
            timeout_secs = config.timeout.map(|t| t.as_secs()),
            "Transcode service initialized"
        );

        Self {
            inner: Arc::new(ServiceInner {
                layout,
                runner,
                segment_duration: config.segment_duration,
                max_concurrent,
                permits: Arc::new(Semaphore::new(max_concurrent)),
                active: AtomicUsize::new(0),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            UploadsLayout::new(config.uploads_dir()),
            TranscodeServiceConfig::from_config(config),
        )
    }

    pub fn layout(&self) -> &UploadsLayout {
        &self.inner.layout
    }

    pub fn ffmpeg_path(&self) -> &str {
        self.inner.runner.ffmpeg_path()
    }

    /// Whether the configured ffmpeg binary resolves to an executable.
    pub fn ffmpeg_available(&self) -> bool {
        which::which(self.ffmpeg_path()).is_ok()
    }

    /// Jobs currently holding a permit.
    pub fn active_jobs(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    pub fn available_permits(&self) -> usize {
        self.inner.permits.available_permits()
    }

    pub fn max_concurrent(&self) -> usize {
        self.inner.max_concurrent
    }

    /// Allocate a job for a staged upload and create its output directory.
    #[tracing::instrument(skip(self, upload), fields(staged_file = %upload.file_name, job_id = tracing::field::Empty))]
    pub async fn prepare(&self, upload: &UploadedFile) -> Result<TranscodeJob, AppError> {
        let job = TranscodeJob::allocate(&self.inner.layout, upload);
        tracing::Span::current().record("job_id", tracing::field::display(&job.id));

        tokio::fs::create_dir_all(&job.output_dir)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    dir = %job.output_dir.display(),
                    "Failed to create job output directory"
                );
                AppError::output_directory(&e)
            })?;

        Ok(job)
    }

    /// Start a job in the background.
    ///
    /// The job waits for a permit, runs ffmpeg and verifies the artifact tree. Dropping
    /// the returned handle before it completes cancels the job.
    pub fn submit(&self, job: TranscodeJob) -> TranscodeHandle {
        let job_id = job.id;
        let token = self.inner.shutdown.child_token();
        let (completion_tx, completion_rx) = oneshot::channel();

        let inner = self.inner.clone();
        let job_token = token.clone();
        let span = tracing::info_span!("transcode_job", job_id = %job_id);
        tokio::spawn(
            async move {
                let result = inner.run_job(job, job_token).await;
                if completion_tx.send(result).is_err() {
                    tracing::debug!("Job finished after its requester went away");
                }
            }
            .instrument(span),
        );

        TranscodeHandle {
            job_id,
            completion: completion_rx,
            guard: token.drop_guard(),
        }
    }

    /// Cancel every queued and running job.
    pub fn shutdown(&self) {
        tracing::info!(active = self.active_jobs(), "Cancelling transcode jobs");
        self.inner.shutdown.cancel();
    }
}

impl ServiceInner {
    async fn run_job(
        &self,
        job: TranscodeJob,
        cancel: CancellationToken,
    ) -> Result<TranscodeReport, AppError> {
        let started = Instant::now();
        let job_id = job.id;
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let (state, tree) = tokio::join!(
            LifecycleObserver::new(job_id).observe(rx),
            async move {
                let outcome = self.execute(&job, &cancel, &tx).await;
                let (terminal, tree) = match outcome {
                    Ok(tree) => (TranscodeEvent::Succeeded, Some(tree)),
                    Err(reason) => (TranscodeEvent::Failed { reason }, None),
                };
                let _ = tx.send(terminal).await;
                tree
            }
        );

        conclude(job_id, state, tree, started.elapsed())
    }

    async fn execute(
        &self,
        job: &TranscodeJob,
        cancel: &CancellationToken,
        events: &mpsc::Sender<TranscodeEvent>,
    ) -> Result<ArtifactTree, FailureReason> {
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FailureReason::Cancelled),
            permit = self.permits.clone().acquire_owned() => permit.map_err(|_| FailureReason::Process {
                message: "transcode service is shut down".to_string(),
            })?,
        };
        let _active = ActiveJob::enter(&self.active);

        let command = HlsCommand::for_job(job, self.segment_duration);
        self.runner.run(&command, cancel.clone(), events).await?;

        ArtifactTree::inspect(&job.output_dir)
            .await
            .map_err(|e| FailureReason::Incomplete {
                message: match e {
                    AppError::ArtifactIncomplete(message) => message,
                    other => other.to_string(),
                },
            })
    }
}

/// Turn the observer's terminal state into the job result.
///
/// The artifact tree is only used once the observer has accepted `Succeeded`.
fn conclude(
    job_id: JobId,
    state: JobState,
    tree: Option<ArtifactTree>,
    elapsed: Duration,
) -> Result<TranscodeReport, AppError> {
    match (state, tree) {
        (JobState::Succeeded, Some(tree)) => {
            tracing::info!(
                segments = tree.segments.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "HLS output ready"
            );
            Ok(TranscodeReport {
                job_id,
                playlist_path: tree.playlist_path,
                segments: tree.segments,
                elapsed,
            })
        }
        (JobState::Failed { reason }, _) => Err(reason.into()),
        (state, _) => Err(AppError::Internal(format!(
            "job ended in unexpected state {:?}",
            state
        ))),
    }
}

/// Handle to a submitted job. Dropping it cancels the job.
pub struct TranscodeHandle {
    job_id: JobId,
    completion: oneshot::Receiver<Result<TranscodeReport, AppError>>,
    guard: DropGuard,
}

impl TranscodeHandle {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Wait until the job reaches a terminal state.
    pub async fn wait(self) -> Result<TranscodeReport, AppError> {
        let TranscodeHandle {
            completion, guard, ..
        } = self;
        let result = completion.await;
        guard.disarm();
        result.unwrap_or_else(|_| {
            Err(AppError::Internal(
                "transcode task ended without a result".to_string(),
            ))
        })
    }
}
