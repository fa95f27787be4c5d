//! Configuration module
//!
//! This module provides the configuration structures for the HTTP server and the
//! upload-to-HLS pipeline. Values come from the environment (a `.env` file is loaded
//! first when present); every key has a default except where noted.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

// Common constants
const SERVER_PORT: u16 = 3000;
const UPLOADS_DIR: &str = "uploads";
const FFMPEG_PATH: &str = "ffmpeg";
const HLS_SEGMENT_DURATION: u64 = 10;
const MAX_CONCURRENT_TRANSCODES: usize = 2;
const TRANSCODE_TIMEOUT_SECS: u64 = 3600;
const MAX_UPLOAD_SIZE_MB: usize = 2048;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

/// Server-level configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub log_json: bool,
}

/// Upload and transcode pipeline configuration
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub base: BaseConfig,
    pub uploads_dir: PathBuf,
    pub ffmpeg_path: String,
    pub hls_segment_duration: u64,
    pub max_concurrent_transcodes: usize,
    /// 0 disables the deadline.
    pub transcode_timeout_secs: u64,
    pub max_upload_size_bytes: usize,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<PipelineConfig>);

impl Config {
    fn as_pipeline(&self) -> &PipelineConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = PipelineConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    /// Build configuration from an arbitrary key lookup instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = PipelineConfig::from_lookup(lookup)?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_pipeline().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_pipeline().base.environment)
    }

    pub fn server_port(&self) -> u16 {
        self.as_pipeline().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_pipeline().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_pipeline().base.environment
    }

    pub fn log_json(&self) -> bool {
        self.as_pipeline().base.log_json
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.as_pipeline().uploads_dir
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.as_pipeline().ffmpeg_path
    }

    pub fn hls_segment_duration(&self) -> u64 {
        self.as_pipeline().hls_segment_duration
    }

    pub fn max_concurrent_transcodes(&self) -> usize {
        self.as_pipeline().max_concurrent_transcodes
    }

    pub fn transcode_timeout(&self) -> Option<Duration> {
        match self.as_pipeline().transcode_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.as_pipeline().max_upload_size_bytes
    }
}

fn is_production_env(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str =
            lookup("CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_upload_size_mb = lookup("MAX_UPLOAD_SIZE_MB")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let base = BaseConfig {
            server_port: lookup("PORT")
                .unwrap_or_else(|| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            log_json: lookup("LOG_FORMAT")
                .map(|s| s.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };

        let config = PipelineConfig {
            base,
            uploads_dir: PathBuf::from(
                lookup("UPLOADS_DIR").unwrap_or_else(|| UPLOADS_DIR.to_string()),
            ),
            ffmpeg_path: lookup("FFMPEG_PATH").unwrap_or_else(|| FFMPEG_PATH.to_string()),
            hls_segment_duration: lookup("HLS_SEGMENT_DURATION")
                .and_then(|s| s.parse().ok())
                .unwrap_or(HLS_SEGMENT_DURATION),
            max_concurrent_transcodes: lookup("MAX_CONCURRENT_TRANSCODES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONCURRENT_TRANSCODES),
            transcode_timeout_secs: lookup("TRANSCODE_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(TRANSCODE_TIMEOUT_SECS),
            max_upload_size_bytes: max_upload_size_mb.saturating_mul(1024 * 1024),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.uploads_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("UPLOADS_DIR must not be empty"));
        }

        if self.ffmpeg_path.trim().is_empty() {
            return Err(anyhow::anyhow!("FFMPEG_PATH must not be empty"));
        }

        if self.hls_segment_duration == 0 {
            return Err(anyhow::anyhow!(
                "HLS_SEGMENT_DURATION must be at least 1 second"
            ));
        }

        if self.max_concurrent_transcodes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_CONCURRENT_TRANSCODES must be at least 1"
            ));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be at least 1"));
        }

        Ok(())
    }
}
