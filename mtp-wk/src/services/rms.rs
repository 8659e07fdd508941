//! RMS volume analyzer client
//!
//! RMS is measured for the full mix ("song") and each stem, giving both
//! overall and per-instrument loudness envelopes.

use super::{build_http_client, post_json, reject_in_band_error, ServiceError};
use mtp_common::types::RmsAnalysis;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SERVICE: &str = "rms";

/// Track names the analyzer understands.
const ANALYZABLE_TRACKS: [&str; 7] = [
    "song", "bass", "drums", "guitar", "other", "piano", "vocals",
];

/// Client for the RMS volume analysis service.
pub struct RmsClient {
    http: reqwest::Client,
    url: String,
}

impl RmsClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            http: build_http_client(SERVICE, timeout)?,
            url: url.into(),
        })
    }

    /// Analyze loudness for the original song and its stems.
    ///
    /// `audio_paths` keys are `song` plus stem names; anything the analyzer
    /// does not understand is filtered out before sending.
    pub async fn analyze(
        &self,
        audio_paths: &BTreeMap<String, PathBuf>,
    ) -> Result<RmsAnalysis, ServiceError> {
        let payload: BTreeMap<&str, &Path> = audio_paths
            .iter()
            .filter(|(track, _)| ANALYZABLE_TRACKS.contains(&track.to_lowercase().as_str()))
            .map(|(track, path)| (track.as_str(), path.as_path()))
            .collect();

        if payload.is_empty() {
            return Err(ServiceError::Service {
                service: SERVICE,
                message: "No audio was submitted for volume analysis.".to_string(),
            });
        }

        let body = serde_json::json!({ "audio_paths": payload });
        let value = post_json(&self.http, SERVICE, &self.url, &body).await?;
        let value = reject_in_band_error(SERVICE, value)?;

        let analysis: RmsAnalysis =
            serde_json::from_value(value).map_err(|err| ServiceError::Decode {
                service: SERVICE,
                message: err.to_string(),
            })?;

        if !analysis.errors.is_empty() {
            tracing::warn!(errors = ?analysis.errors, "RMS analyzer reported per-file errors");
        }
        Ok(analysis)
    }
}
