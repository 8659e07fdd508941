//! Stored-artifact routes: playback serving and client-driven removal
//!
//! Uploaded audio outlives its job so the finished result's `audio_url`
//! keeps resolving; the client deletes it here once playback is done.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::{delete, get},
    Json, Router,
};
use serde_json::json;
use tokio_util::io::ReaderStream;

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};
use mtp_common::fsnames;

/// GET /api/files/{name}
///
/// Streams the stored audio inline so browsers play it instead of
/// downloading it.
pub async fn serve_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let safe_name = fsnames::sanitize_filename(&name)
        .filter(|sanitized| *sanitized == name)
        .ok_or_else(|| ApiError::NotFound("File not found.".to_string()))?;

    let path = state.settings.audio_dir().join(&safe_name);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("File not found.".to_string()));
        }
        Err(err) => return Err(err.into()),
    };

    let body = Body::from_stream(ReaderStream::new(file));
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&safe_name))
        .header(header::CONTENT_DISPOSITION, "inline")
        .body(body)
        .map_err(|err| ApiError::Internal(format!("Failed to build response: {err}")))?;
    Ok(response)
}

/// DELETE /api/cleanup/{name}
///
/// Idempotent: removing an already-absent artifact still returns 200.
pub async fn cleanup_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    // The sanitized name must equal the request name; anything else is a
    // traversal attempt.
    let safe_name = fsnames::sanitize_filename(&name)
        .filter(|sanitized| *sanitized == name)
        .ok_or_else(|| ApiError::BadRequest("Invalid file name.".to_string()))?;

    let path = state.settings.audio_dir().join(&safe_name);
    let removed = fsnames::remove_path_if_exists(&path).await?;

    tracing::info!(file = %safe_name, removed, "Cleanup requested");
    Ok(Json(json!({
        "message": format!("File '{safe_name}' cleaned up.")
    })))
}

fn content_type_for(name: &str) -> &'static str {
    match name.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("flac") => "audio/flac",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        Some("aiff") | Some("aif") => "audio/aiff",
        _ => "application/octet-stream",
    }
}

/// Build artifact routes
pub fn files_routes() -> Router<AppState> {
    Router::new()
        .route("/api/files/:name", get(serve_file))
        .route("/api/cleanup/:name", delete(cleanup_file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_cover_playback_formats() {
        assert_eq!(content_type_for("a.wav"), "audio/wav");
        assert_eq!(content_type_for("a.MP3"), "audio/mpeg");
        assert_eq!(content_type_for("a.flac"), "audio/flac");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
