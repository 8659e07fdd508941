//! Forced aligner client
//!
//! Aligns the lyrics transcript against the vocals stem. The aligner writes
//! its JSON output to the shared volume and answers with the path.

use super::{build_http_client, post_json, reject_in_band_error, ServiceError};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SERVICE: &str = "aligner";

/// Client for the forced alignment service.
pub struct AlignerClient {
    http: reqwest::Client,
    url: String,
}

impl AlignerClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            http: build_http_client(SERVICE, timeout)?,
            url: url.into(),
        })
    }

    /// Align the lyrics against the vocals stem.
    ///
    /// Returns the shared-volume path of the alignment JSON document.
    pub async fn align(
        &self,
        vocals_stem_path: &Path,
        lyrics_path: &Path,
    ) -> Result<PathBuf, ServiceError> {
        let body = serde_json::json!({
            "vocals_stem_path": vocals_stem_path,
            "lyrics_path": lyrics_path,
        });
        let value = post_json(&self.http, SERVICE, &self.url, &body).await?;
        let value = reject_in_band_error(SERVICE, value)?;

        let alignment_path = value
            .get("alignment_file_path")
            .and_then(|path| path.as_str())
            .ok_or_else(|| ServiceError::Service {
                service: SERVICE,
                message: "Aligner response missing 'alignment_file_path'".to_string(),
            })?;

        tracing::info!(alignment = alignment_path, "Aligner produced alignment file");
        Ok(PathBuf::from(alignment_path))
    }
}
