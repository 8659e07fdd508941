//! mtp-gw library interface
//!
//! Exposes the router and application state so integration tests can drive
//! the gateway without binding a socket.

pub mod api;
pub mod error;
pub mod validate;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use mtp_common::{Broker, Settings};
use std::sync::Arc;

/// Uploads carry whole audio tracks; the default 2 MB multipart cap is far
/// too small for them.
const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Broker handle; holds the process-wide connection manager
    pub broker: Arc<Broker>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(broker: Broker, settings: Settings) -> Self {
        Self {
            broker: Arc::new(broker),
            settings: Arc::new(settings),
        }
    }
}

/// Build application router
///
/// - POST /api/translate - submit audio + lyrics, returns a job id
/// - GET /api/results/:job_id - poll job status and fetch the result
/// - GET /api/files/:name - serve a stored audio artifact for playback
/// - DELETE /api/cleanup/:name - remove a stored audio artifact
/// - GET /api/translate/health - gateway + broker health
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::translate_routes())
        .merge(api::results_routes())
        .merge(api::files_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
