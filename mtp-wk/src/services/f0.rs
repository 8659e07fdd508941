//! Fundamental frequency analyzer client
//!
//! Only tonal stems are worth analyzing; percussion is filtered out before
//! the request is made. When nothing tonal remains the client answers
//! locally with a skip record instead of calling the service.

use super::{build_http_client, post_json, reject_in_band_error, ServiceError};
use mtp_common::types::F0Series;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SERVICE: &str = "f0";

/// Stems with a fundamental to find.
const TONAL_STEMS: [&str; 5] = ["vocals", "bass", "guitar", "piano", "other"];

/// Outcome of an F0 request that did not error.
#[derive(Debug)]
pub enum F0Outcome {
    /// Per-instrument series; `None` where the analyzer found no F0.
    Analyzed(BTreeMap<String, Option<F0Series>>),
    /// Nothing tonal to analyze; the service was never called.
    Skipped { info: String },
}

/// Client for the F0 analysis service.
pub struct F0Client {
    http: reqwest::Client,
    url: String,
}

impl F0Client {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            http: build_http_client(SERVICE, timeout)?,
            url: url.into(),
        })
    }

    /// Analyze the tonal stems of a separated track.
    pub async fn analyze(
        &self,
        stem_paths: &BTreeMap<String, PathBuf>,
    ) -> Result<F0Outcome, ServiceError> {
        let payload: BTreeMap<&str, &Path> = stem_paths
            .iter()
            .filter(|(stem, path)| {
                let stem = stem.to_lowercase();
                if stem == "drums" {
                    tracing::debug!(path = %path.display(), "Skipping F0 analysis for drums stem");
                    return false;
                }
                TONAL_STEMS.contains(&stem.as_str())
            })
            .map(|(stem, path)| (stem.as_str(), path.as_path()))
            .collect();

        if payload.is_empty() {
            tracing::warn!("No tonal stems to analyze, skipping F0 request");
            return Ok(F0Outcome::Skipped {
                info: "No relevant stems were submitted for F0 analysis.".to_string(),
            });
        }

        let body = serde_json::json!({ "stem_paths": payload });
        let value = post_json(&self.http, SERVICE, &self.url, &body).await?;
        let value = reject_in_band_error(SERVICE, value)?;

        let series: BTreeMap<String, Option<F0Series>> =
            serde_json::from_value(value).map_err(|err| ServiceError::Decode {
                service: SERVICE,
                message: err.to_string(),
            })?;

        tracing::info!(
            instruments = ?series.keys().collect::<Vec<_>>(),
            "F0 analysis complete"
        );
        Ok(F0Outcome::Analyzed(series))
    }
}
