//! ffmpeg progress parsing.
//!
//! The total duration comes from the `Duration:` line ffmpeg prints on stderr when it
//! opens the input. Position comes from the `-progress` key=value stream, which ends
//! each block with a `progress=continue|end` line.

use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    total: Option<Duration>,
    position: Option<Duration>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one stderr line. Only the first input duration is kept.
    pub fn observe_diagnostic(&mut self, line: &str) {
        if self.total.is_none() {
            if let Some(total) = parse_duration_line(line) {
                self.total = Some(total);
            }
        }
    }

    /// Feed one stdout line of the `-progress` stream.
    ///
    /// Returns `Some(percent)` when a block completes; `percent` is `None` while the
    /// total duration is unknown.
    pub fn observe_progress(&mut self, line: &str) -> Option<Option<f64>> {
        let (key, value) = line.trim().split_once('=')?;
        match key {
            "out_time_us" | "out_time_ms" => {
                // ffmpeg reports microseconds under both keys
                if let Ok(us) = value.trim().parse::<i64>() {
                    if us >= 0 {
                        self.position = Some(Duration::from_micros(us as u64));
                    }
                }
                None
            }
            "out_time" => {
                if let Some(position) = parse_timestamp(value) {
                    self.position = Some(position);
                }
                None
            }
            "progress" => {
                if value.trim() == "end" {
                    if let Some(total) = self.total {
                        self.position = Some(total);
                    }
                }
                Some(self.percent())
            }
            _ => None,
        }
    }

    pub fn percent(&self) -> Option<f64> {
        let total = self.total?.as_secs_f64();
        if total <= 0.0 {
            return None;
        }
        let position = self.position.map(|p| p.as_secs_f64()).unwrap_or(0.0);
        Some((position / total * 100.0).clamp(0.0, 100.0))
    }
}

/// Parse `  Duration: 00:01:02.50, start: 0.000000, bitrate: ...`.
///
/// `Duration: N/A` yields `None`.
pub fn parse_duration_line(line: &str) -> Option<Duration> {
    let rest = line.trim_start().strip_prefix("Duration:")?;
    let value = rest.split(',').next()?.trim();
    parse_timestamp(value)
}

/// Parse `HH:MM:SS[.fraction]`.
pub fn parse_timestamp(value: &str) -> Option<Duration> {
    let mut parts = value.trim().split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    Some(Duration::from_secs(hours * 3600 + minutes * 60) + Duration::from_secs_f64(seconds))
}
