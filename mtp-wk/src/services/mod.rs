//! HTTP clients for the external analyzer services
//!
//! One thin client per service. Every failure mode — transport, timeout,
//! non-2xx, undecodable body, or an in-band `{"error": ...}` payload — is
//! classified into a [`ServiceError`] variant; clients never panic and
//! never retry. The pipeline decides which stages' errors are fatal.

mod aligner;
mod drums;
mod f0;
mod rms;
mod separator;

pub use aligner::AlignerClient;
pub use drums::DrumClient;
pub use f0::{F0Client, F0Outcome};
pub use rms::RmsClient;
pub use separator::SeparatorClient;

use thiserror::Error;

/// Classified failure of an analyzer call.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service answered outside the 2xx range.
    #[error("{service} returned HTTP {status}: {body}")]
    Http {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The request never completed (connect/transport failure).
    #[error("Error communicating with {service}: {message}")]
    Connection {
        service: &'static str,
        message: String,
    },

    /// The per-request timeout elapsed.
    #[error("Timeout calling {service}")]
    Timeout { service: &'static str },

    /// The 2xx body was not the JSON shape the service promises.
    #[error("Error decoding response from {service}: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    /// The service reported an error in-band (`{"error": ...}`).
    #[error("{message}")]
    Service {
        service: &'static str,
        message: String,
    },
}

impl ServiceError {
    /// The message as the service reported it, for in-band errors; the
    /// classified description otherwise. Degraded results carry this so the
    /// client sees what the analyzer actually said.
    pub fn message(&self) -> String {
        match self {
            ServiceError::Service { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

fn classify(service: &'static str, err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout { service }
    } else if err.is_decode() {
        ServiceError::Decode {
            service,
            message: err.to_string(),
        }
    } else {
        ServiceError::Connection {
            service,
            message: err.to_string(),
        }
    }
}

fn build_http_client(
    service: &'static str,
    timeout: std::time::Duration,
) -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| classify(service, err))
}

/// POST a JSON body and return the decoded JSON response.
async fn post_json(
    http: &reqwest::Client,
    service: &'static str,
    url: &str,
    body: &serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    tracing::debug!(service, url, "Calling analyzer service");

    let response = http
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|err| classify(service, err))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::Http {
            service,
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<serde_json::Value>()
        .await
        .map_err(|err| classify(service, err))
}

/// Reject a 2xx response that carries an in-band `{"error": ...}` record.
fn reject_in_band_error(
    service: &'static str,
    value: serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    if let Some(message) = value.get("error").and_then(|m| m.as_str()) {
        return Err(ServiceError::Service {
            service,
            message: message.to_string(),
        });
    }
    Ok(value)
}
