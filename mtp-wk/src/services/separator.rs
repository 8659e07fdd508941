//! Stem separator client
//!
//! The separator resolves the filename under its own mount of the shared
//! audio directory and answers with absolute stem paths on that volume.

use super::{build_http_client, post_json, reject_in_band_error, ServiceError};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

const SERVICE: &str = "separator";

/// Client for the stem separation service.
pub struct SeparatorClient {
    http: reqwest::Client,
    url: String,
}

impl SeparatorClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            http: build_http_client(SERVICE, timeout)?,
            url: url.into(),
        })
    }

    /// Split the stored audio file into per-instrument stems.
    ///
    /// Returns a stem-name → absolute-path map. Which stems come back
    /// depends on the separator model; the pipeline checks for the ones it
    /// needs.
    pub async fn separate(
        &self,
        audio_filename: &str,
    ) -> Result<BTreeMap<String, PathBuf>, ServiceError> {
        let body = serde_json::json!({ "audio_filename": audio_filename });
        let value = post_json(&self.http, SERVICE, &self.url, &body).await?;
        let value = reject_in_band_error(SERVICE, value)?;

        let object = value.as_object().ok_or_else(|| ServiceError::Decode {
            service: SERVICE,
            message: "expected a stem-to-path object".to_string(),
        })?;

        let mut stems = BTreeMap::new();
        for (stem, path) in object {
            let path = path.as_str().ok_or_else(|| ServiceError::Decode {
                service: SERVICE,
                message: format!("stem '{stem}' path is not a string"),
            })?;
            stems.insert(stem.clone(), PathBuf::from(path));
        }

        tracing::info!(
            stems = ?stems.keys().collect::<Vec<_>>(),
            "Separator returned stems"
        );
        Ok(stems)
    }
}
