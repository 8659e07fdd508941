//! Configuration loading for the gateway and worker binaries
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (handled by the binaries via clap)
//! 2. Environment variable
//! 3. Compiled default
//!
//! The compiled defaults match the reference Kubernetes deployment: a Redis
//! broker at `redis-service:6379`, a shared volume mounted at `/shared-data`,
//! and one in-cluster HTTP endpoint per analyzer service.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Process-wide settings shared by the gateway and the worker.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Redis broker host
    pub redis_host: String,
    /// Redis broker port
    pub redis_port: u16,
    /// Root of the shared volume visible to all services
    pub shared_data_dir: PathBuf,
    /// Stem separator endpoint
    pub separator_url: String,
    /// Forced aligner endpoint
    pub aligner_url: String,
    /// Fundamental frequency analyzer endpoint
    pub f0_url: String,
    /// RMS volume analyzer endpoint
    pub rms_url: String,
    /// Drum onset analyzer endpoint
    pub drum_url: String,
    /// Closed allow-list of submission access codes
    pub access_codes: HashSet<String>,
    /// Per-job processing budget in seconds
    pub job_timeout_secs: u64,
    /// Retention of terminal job records in the broker, seconds
    pub result_ttl_secs: i64,
    /// Per-request timeout for analyzer calls, seconds
    pub service_timeout_secs: u64,
}

impl Settings {
    /// Load settings from the environment, falling back to compiled defaults.
    pub fn from_env() -> Self {
        Self {
            redis_host: env_or("REDIS_HOST", "redis-service"),
            redis_port: env_parse("REDIS_PORT", 6379),
            shared_data_dir: PathBuf::from(env_or("SHARED_DATA_DIR", "/shared-data")),
            separator_url: env_or(
                "SEPARATOR_URL",
                "http://separator-service:22227/separate",
            ),
            aligner_url: env_or("ALIGNER_URL", "http://mfa-service:24725/api/align"),
            f0_url: env_or("F0_URL", "http://f0-service:20006/analyze_f0"),
            rms_url: env_or("RMS_URL", "http://rms-service:39574/api/analyze_rms"),
            drum_url: env_or("DRUM_URL", "http://drum-service:20007/api/analyze_drums"),
            access_codes: parse_access_codes(
                &std::env::var("ACCESS_CODES").unwrap_or_default(),
            ),
            job_timeout_secs: env_parse("JOB_TIMEOUT_SECS", 5000),
            result_ttl_secs: env_parse("RESULT_TTL_SECS", 500),
            service_timeout_secs: env_parse("SERVICE_TIMEOUT_SECS", 1200),
        }
    }

    /// Redis connection URL for the broker client.
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/", self.redis_host, self.redis_port)
    }

    /// Directory holding uploaded audio, served back for playback.
    pub fn audio_dir(&self) -> PathBuf {
        self.shared_data_dir.join("audio")
    }

    /// Directory holding uploaded lyrics transcripts.
    pub fn lyrics_dir(&self) -> PathBuf {
        self.shared_data_dir.join("lyrics")
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse the comma-separated `ACCESS_CODES` value into the allow-list.
/// Blank entries are dropped so a trailing comma cannot open the gateway.
pub fn parse_access_codes(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve an optional CLI override against an already-loaded setting.
pub fn override_path(current: &Path, cli: Option<&str>) -> PathBuf {
    match cli {
        Some(path) => PathBuf::from(path),
        None => current.to_path_buf(),
    }
}
