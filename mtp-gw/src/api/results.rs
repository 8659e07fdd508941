//! Polling endpoint for job status and results

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::{error::ApiError, AppState};
use mtp_common::broker::JobStatus;

/// GET /api/results/{job_id}
///
/// - 200 `{status: "finished", result}` once the job completed
/// - 202 `{status, progress_stage?}` while it is queued or running
/// - 404 for unknown or malformed job ids
/// - 500 `{status: "failed", message}` for failed jobs
/// - 503 when the broker cannot be reached
pub async fn get_results(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Response, ApiError> {
    // Malformed ids cannot name a job, so they 404 without a broker round trip.
    let Ok(job_id) = Uuid::parse_str(&job_id) else {
        return Err(not_found());
    };

    let job = state
        .broker
        .fetch_state(job_id)
        .await
        .map_err(|err| ApiError::Unavailable(format!("Translation queue unavailable: {err}")))?
        .ok_or_else(not_found)?;

    let Some(status) = job.status else {
        return Err(ApiError::Internal("Job record is corrupted.".to_string()));
    };

    match status {
        JobStatus::Finished => match job.result {
            Some(result) if result.is_object() => Ok((
                StatusCode::OK,
                Json(json!({"status": "finished", "result": result})),
            )
                .into_response()),
            _ => Err(ApiError::Internal(
                "Job finished but its result is missing or corrupted.".to_string(),
            )),
        },
        JobStatus::Failed => {
            let message = job
                .exc_info
                .unwrap_or_else(|| "Translation failed.".to_string());
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"status": "failed", "message": message})),
            )
                .into_response())
        }
        JobStatus::Queued | JobStatus::Started => {
            let mut body = json!({"status": status.as_str()});
            if let Some(stage) = job.progress_stage {
                body["progress_stage"] = json!(stage);
            }
            Ok((StatusCode::ACCEPTED, Json(body)).into_response())
        }
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("Job ID not found or invalid.".to_string())
}

/// Build polling routes
pub fn results_routes() -> Router<AppState> {
    Router::new().route("/api/results/:job_id", get(get_results))
}
