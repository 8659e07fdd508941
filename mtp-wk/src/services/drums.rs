//! Drum onset analyzer client

use super::{build_http_client, post_json, ServiceError};
use mtp_common::types::DrumHit;
use std::path::Path;
use std::time::Duration;

const SERVICE: &str = "drums";

/// Client for the drum onset analysis service.
pub struct DrumClient {
    http: reqwest::Client,
    url: String,
}

impl DrumClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            http: build_http_client(SERVICE, timeout)?,
            url: url.into(),
        })
    }

    /// Detect percussive onsets in the drums stem.
    pub async fn analyze(&self, drums_path: &Path) -> Result<Vec<DrumHit>, ServiceError> {
        let body = serde_json::json!({ "drums_path": drums_path });
        let value = post_json(&self.http, SERVICE, &self.url, &body).await?;

        // The analyzer answers with a bare array; an object is its error shape.
        if value.is_object() {
            let message = value
                .get("error")
                .and_then(|m| m.as_str())
                .unwrap_or("Drum analyzer returned an unexpected object")
                .to_string();
            return Err(ServiceError::Service {
                service: SERVICE,
                message,
            });
        }

        let hits: Vec<DrumHit> =
            serde_json::from_value(value).map_err(|err| ServiceError::Decode {
                service: SERVICE,
                message: err.to_string(),
            })?;

        tracing::info!(onsets = hits.len(), "Drum analysis complete");
        Ok(hits)
    }
}
