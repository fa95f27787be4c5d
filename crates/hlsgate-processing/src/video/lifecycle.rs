//! Per-job lifecycle events and the state machine that consumes them.
//!
//! A job moves `Pending -> Started -> Progressing* -> Succeeded | Failed`. The runner
//! emits [`TranscodeEvent`]s on a channel; one [`LifecycleObserver`] per job consumes
//! them in order, logs them and records the terminal outcome.

use hlsgate_core::{AppError, JobId};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum TranscodeEvent {
    Started { command_line: String },
    Progress { percent: Option<f64> },
    /// One stderr line; never changes state
    Diagnostic { line: String },
    Failed { reason: FailureReason },
    Succeeded,
}

impl TranscodeEvent {
    fn name(&self) -> &'static str {
        match self {
            TranscodeEvent::Started { .. } => "started",
            TranscodeEvent::Progress { .. } => "progress",
            TranscodeEvent::Diagnostic { .. } => "diagnostic",
            TranscodeEvent::Failed { .. } => "failed",
            TranscodeEvent::Succeeded => "succeeded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Spawn failure or non-zero exit, with the process message
    Process { message: String },
    TimedOut { seconds: u64 },
    Cancelled,
    /// Process exited cleanly but the playlist or its segments are unusable
    Incomplete { message: String },
}

impl From<FailureReason> for AppError {
    fn from(reason: FailureReason) -> Self {
        match reason {
            FailureReason::Process { message } => AppError::transcode(message),
            FailureReason::TimedOut { seconds } => AppError::TranscodeTimeout { seconds },
            FailureReason::Cancelled => AppError::transcode("transcode cancelled"),
            FailureReason::Incomplete { message } => AppError::ArtifactIncomplete(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Pending,
    Started,
    Progressing { percent: Option<f64> },
    Succeeded,
    Failed { reason: FailureReason },
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("invalid lifecycle transition from {from} on {event} event")]
pub struct InvalidTransition {
    pub from: &'static str,
    pub event: &'static str,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Started => "started",
            JobState::Progressing { .. } => "progressing",
            JobState::Succeeded => "succeeded",
            JobState::Failed { .. } => "failed",
        }
    }

    /// Next state after `event`.
    ///
    /// Terminal states accept nothing. `Failed` is allowed from `Pending` (spawn
    /// failure, cancellation while queued); `Succeeded` requires a started process.
    pub fn apply(&self, event: &TranscodeEvent) -> Result<JobState, InvalidTransition> {
        let invalid = || InvalidTransition {
            from: self.name(),
            event: event.name(),
        };

        if self.is_terminal() {
            return Err(invalid());
        }

        match (self, event) {
            (JobState::Pending, TranscodeEvent::Started { .. }) => Ok(JobState::Started),
            (JobState::Pending, TranscodeEvent::Diagnostic { .. }) => Ok(JobState::Pending),
            (JobState::Pending, TranscodeEvent::Progress { .. }) => Err(invalid()),
            (JobState::Pending, TranscodeEvent::Succeeded) => Err(invalid()),
            (_, TranscodeEvent::Started { .. }) => Err(invalid()),
            (_, TranscodeEvent::Progress { percent }) => Ok(JobState::Progressing {
                percent: *percent,
            }),
            (_, TranscodeEvent::Diagnostic { .. }) => Ok(self.clone()),
            (_, TranscodeEvent::Succeeded) => Ok(JobState::Succeeded),
            (_, TranscodeEvent::Failed { reason }) => Ok(JobState::Failed {
                reason: reason.clone(),
            }),
        }
    }
}

/// Consumes the event stream of one job.
#[derive(Debug)]
pub struct LifecycleObserver {
    job_id: JobId,
    state: JobState,
    command_line: Option<String>,
}

impl LifecycleObserver {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            state: JobState::Pending,
            command_line: None,
        }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn command_line(&self) -> Option<&str> {
        self.command_line.as_deref()
    }

    pub fn handle(&mut self, event: TranscodeEvent) {
        let next = match self.state.apply(&event) {
            Ok(next) => next,
            Err(err) => {
                tracing::warn!(job_id = %self.job_id, error = %err, "Ignoring lifecycle event");
                return;
            }
        };

        match &event {
            TranscodeEvent::Started { command_line } => {
                tracing::info!(job_id = %self.job_id, command = %command_line, "Transcode started");
                self.command_line = Some(command_line.clone());
            }
            TranscodeEvent::Progress { percent } => match percent {
                Some(percent) => {
                    tracing::info!(job_id = %self.job_id, percent = *percent, "Transcode progress")
                }
                None => tracing::info!(job_id = %self.job_id, "Transcode progress (duration unknown)"),
            },
            TranscodeEvent::Diagnostic { line } => {
                tracing::debug!(job_id = %self.job_id, "ffmpeg: {}", line);
            }
            TranscodeEvent::Failed { reason } => {
                tracing::error!(job_id = %self.job_id, reason = ?reason, "Transcode failed");
            }
            TranscodeEvent::Succeeded => {
                tracing::info!(job_id = %self.job_id, "Transcode finished");
            }
        }

        self.state = next;
    }

    /// Drain `events` until the sender side closes and return the final state.
    pub async fn observe(mut self, mut events: mpsc::Receiver<TranscodeEvent>) -> JobState {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        if !self.state.is_terminal() {
            tracing::warn!(job_id = %self.job_id, state = self.state.name(), "Event stream closed before a terminal event");
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> TranscodeEvent {
        TranscodeEvent::Started {
            command_line: "ffmpeg -i in.mp4".to_string(),
        }
    }

    #[test]
    fn test_happy_path() {
        let mut observer = LifecycleObserver::new(JobId::generate());
        observer.handle(started());
        observer.handle(TranscodeEvent::Diagnostic {
            line: "Duration: 00:00:10.00".to_string(),
        });
        assert_eq!(observer.state(), &JobState::Started);
        observer.handle(TranscodeEvent::Progress { percent: Some(50.0) });
        observer.handle(TranscodeEvent::Progress { percent: None });
        assert_eq!(observer.state(), &JobState::Progressing { percent: None });
        observer.handle(TranscodeEvent::Succeeded);
        assert_eq!(observer.state(), &JobState::Succeeded);
        assert_eq!(observer.command_line(), Some("ffmpeg -i in.mp4"));
    }

    #[test]
    fn test_events_after_terminal_are_ignored() {
        let mut observer = LifecycleObserver::new(JobId::generate());
        observer.handle(started());
        observer.handle(TranscodeEvent::Failed {
            reason: FailureReason::Cancelled,
        });
        observer.handle(TranscodeEvent::Succeeded);
        observer.handle(TranscodeEvent::Progress { percent: Some(10.0) });
        assert_eq!(
            observer.state(),
            &JobState::Failed {
                reason: FailureReason::Cancelled
            }
        );
    }

    #[test]
    fn test_started_only_once() {
        let state = JobState::Started.apply(&started());
        assert_eq!(
            state,
            Err(InvalidTransition {
                from: "started",
                event: "started"
            })
        );
    }

    #[test]
    fn test_success_requires_start() {
        assert!(JobState::Pending.apply(&TranscodeEvent::Succeeded).is_err());
        let failed = JobState::Pending.apply(&TranscodeEvent::Failed {
            reason: FailureReason::Process {
                message: "spawn failed".to_string(),
            },
        });
        assert!(failed.map(|s| s.is_terminal()).unwrap_or(false));
    }

    #[test]
    fn test_failure_reason_maps_to_app_error() {
        let err: AppError = FailureReason::TimedOut { seconds: 5 }.into();
        assert!(matches!(err, AppError::TranscodeTimeout { seconds: 5 }));

        let err: AppError = FailureReason::Cancelled.into();
        assert_eq!(err.to_string(), "transcode cancelled");

        let err: AppError = FailureReason::Process {
            message: "ffmpeg exited with code 1: boom".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "ffmpeg exited with code 1: boom");
    }

    #[tokio::test]
    async fn test_observe_drains_channel() {
        let (tx, rx) = mpsc::channel(8);
        let observer = LifecycleObserver::new(JobId::generate());
        let handle = tokio::spawn(observer.observe(rx));

        tx.send(started()).await.expect("send");
        tx.send(TranscodeEvent::Progress { percent: Some(100.0) })
            .await
            .expect("send");
        tx.send(TranscodeEvent::Succeeded).await.expect("send");
        drop(tx);

        let state = handle.await.expect("join");
        assert_eq!(state, JobState::Succeeded);
    }
}
