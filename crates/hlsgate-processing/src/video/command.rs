//! ffmpeg argument builder for single-rendition HLS output.

use hlsgate_core::{TranscodeJob, SEGMENT_FILE_PATTERN};
use std::path::PathBuf;

const VIDEO_CODEC: &str = "libx264";
const AUDIO_CODEC: &str = "aac";

/// Builder for one ffmpeg HLS invocation.
#[derive(Debug, Clone)]
pub struct HlsCommand {
    input: PathBuf,
    output_dir: PathBuf,
    playlist_path: PathBuf,
    segment_duration: u64,
}

impl HlsCommand {
    pub fn for_job(job: &TranscodeJob, segment_duration: u64) -> Self {
        Self {
            input: job.input_path.clone(),
            output_dir: job.output_dir.clone(),
            playlist_path: job.playlist_path.clone(),
            segment_duration,
        }
    }

    pub fn segment_pattern(&self) -> PathBuf {
        self.output_dir.join(SEGMENT_FILE_PATTERN)
    }

    /// Build the argument vector (without the program name).
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-nostats".to_string(),
            // Key=value progress blocks on stdout; stderr stays free for diagnostics
            "-progress".to_string(),
            "pipe:1".to_string(),
            "-i".to_string(),
            self.input.to_string_lossy().to_string(),
            "-c:v".to_string(),
            VIDEO_CODEC.to_string(),
            "-c:a".to_string(),
            AUDIO_CODEC.to_string(),
        ];

        // Keyframes on segment boundaries so every segment starts decodable
        args.push("-force_key_frames".to_string());
        args.push(format!(
            "expr:gte(t,n_forced*{})",
            self.segment_duration
        ));

        args.extend_from_slice(&[
            "-f".to_string(),
            "hls".to_string(),
            "-hls_time".to_string(),
            self.segment_duration.to_string(),
            "-hls_list_size".to_string(),
            "0".to_string(),
            "-hls_playlist_type".to_string(),
            "vod".to_string(),
            "-hls_segment_filename".to_string(),
            self.segment_pattern().to_string_lossy().to_string(),
            self.playlist_path.to_string_lossy().to_string(),
        ]);

        args
    }

    /// Human-readable command line for logs and the `Started` event.
    pub fn command_line(&self, program: &str) -> String {
        let mut line = String::from(program);
        for arg in self.build_args() {
            line.push(' ');
            if arg.contains(char::is_whitespace) {
                line.push('"');
                line.push_str(&arg);
                line.push('"');
            } else {
                line.push_str(&arg);
            }
        }
        line
    }
}
