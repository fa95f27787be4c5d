//! Runs one ffmpeg process and turns its output into lifecycle events.

use std::collections::VecDeque;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::command::HlsCommand;
use super::lifecycle::{FailureReason, TranscodeEvent};
use super::progress::ProgressTracker;

/// Number of trailing stderr lines kept for the failure message.
const STDERR_TAIL_LINES: usize = 8;

enum Exit {
    Status(std::io::Result<ExitStatus>),
    Cancelled,
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    ffmpeg_path: String,
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.ffmpeg_path
    }

    /// Run `command` to completion.
    ///
    /// Emits `Started`, then `Diagnostic` and `Progress` events while the process runs.
    /// The terminal event is left to the caller, which still has to check the output.
    /// The process is killed when `cancel` fires or the timeout elapses.
    pub async fn run(
        &self,
        command: &HlsCommand,
        cancel: CancellationToken,
        events: &mpsc::Sender<TranscodeEvent>,
    ) -> Result<(), FailureReason> {
        let args = command.build_args();
        let command_line = command.command_line(&self.ffmpeg_path);

        let mut child = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| FailureReason::Process {
                message: format!("failed to start {}: {}", self.ffmpeg_path, e),
            })?;

        let _ = events.send(TranscodeEvent::Started { command_line }).await;

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                let _ = child.kill().await;
                return Err(FailureReason::Process {
                    message: "ffmpeg output pipes were not captured".to_string(),
                });
            }
        };
        let mut stdout_lines = BufReader::new(stdout).lines();
        let mut stderr_lines = BufReader::new(stderr).lines();
        let mut stdout_open = true;
        let mut stderr_open = true;

        let mut tracker = ProgressTracker::new();
        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

        let timeout = self.timeout;
        let deadline = async move {
            match timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let exit = loop {
            tokio::select! {
                // stderr before stdout, so the input duration is known before progress
                biased;
                _ = cancel.cancelled() => break Exit::Cancelled,
                _ = &mut deadline => break Exit::TimedOut,
                line = stderr_lines.next_line(), if stderr_open => match line {
                    Ok(Some(line)) => {
                        let line = line.trim_end().to_string();
                        if line.is_empty() {
                            continue;
                        }
                        tracker.observe_diagnostic(&line);
                        if tail.len() == STDERR_TAIL_LINES {
                            tail.pop_front();
                        }
                        tail.push_back(line.clone());
                        let _ = events.send(TranscodeEvent::Diagnostic { line }).await;
                    }
                    _ => stderr_open = false,
                },
                line = stdout_lines.next_line(), if stdout_open => match line {
                    Ok(Some(line)) => {
                        if let Some(percent) = tracker.observe_progress(&line) {
                            let _ = events.send(TranscodeEvent::Progress { percent }).await;
                        }
                    }
                    _ => stdout_open = false,
                },
                status = child.wait(), if !stdout_open && !stderr_open => break Exit::Status(status),
            }
        };

        match exit {
            Exit::Status(Ok(status)) if status.success() => Ok(()),
            Exit::Status(Ok(status)) => {
                let cause = match status.code() {
                    Some(code) => format!("ffmpeg exited with code {}", code),
                    None => "ffmpeg was terminated by a signal".to_string(),
                };
                let stderr = tail.into_iter().collect::<Vec<_>>().join("\n");
                let message = if stderr.is_empty() {
                    cause
                } else {
                    format!("{}: {}", cause, stderr)
                };
                Err(FailureReason::Process { message })
            }
            Exit::Status(Err(e)) => Err(FailureReason::Process {
                message: format!("failed to wait for ffmpeg: {}", e),
            }),
            Exit::Cancelled => {
                tracing::info!("Transcode cancelled, killing ffmpeg");
                if let Err(e) = child.kill().await {
                    tracing::warn!(error = %e, "Failed to kill ffmpeg");
                }
                Err(FailureReason::Cancelled)
            }
            Exit::TimedOut => {
                let seconds = timeout.map(|t| t.as_secs()).unwrap_or_default();
                tracing::warn!(timeout_secs = seconds, "Transcode timed out, killing ffmpeg");
                if let Err(e) = child.kill().await {
                    tracing::warn!(error = %e, "Failed to kill ffmpeg");
                }
                Err(FailureReason::TimedOut { seconds })
            }
        }
    }
}
