//! Submission endpoint: accept audio + lyrics, enqueue a translation job
//!
//! The checks run in a fixed order so clients get the most actionable
//! rejection first: broker reachability, then authorization, then request
//! shape, then file contents. Persisted inputs are best-effort deleted on
//! every failure past the point they were written.

use axum::{
    extract::{Multipart, Query, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    validate, AppState,
};
use mtp_common::broker::{JobPayload, TranslationJob, TRANSLATION_QUEUE};
use mtp_common::fsnames;

/// Access code from the query string; the X-Access-Code header is the
/// alternative carrier.
#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub access_code: Option<String>,
}

/// POST /api/translate response
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    /// Token to poll /api/results/{job_id} with
    pub job_id: Uuid,
}

/// One uploaded multipart part, fully buffered.
struct UploadedPart {
    filename: String,
    bytes: axum::body::Bytes,
}

/// POST /api/translate
///
/// Returns 202 Accepted with the job id on success.
pub async fn submit_translation(
    State(state): State<AppState>,
    Query(query): Query<AccessQuery>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    // Queue first: a dead broker makes every submission pointless, whatever
    // else is wrong with it.
    state
        .broker
        .ping()
        .await
        .map_err(|err| ApiError::Unavailable(format!("Translation queue unavailable: {err}")))?;

    authorize(&state, &query, &headers)?;

    let (audio, lyrics) = read_upload_parts(multipart).await?;
    let (Some(audio), Some(lyrics)) = (audio, lyrics) else {
        return Err(ApiError::BadRequest("Missing audio or lyrics file.".to_string()));
    };

    let audio_name = fsnames::sanitize_filename(&audio.filename)
        .ok_or_else(|| ApiError::BadRequest("Invalid audio filename.".to_string()))?;
    let lyrics_name = fsnames::sanitize_filename(&lyrics.filename)
        .ok_or_else(|| ApiError::BadRequest("Invalid lyrics filename.".to_string()))?;

    let job_id = Uuid::new_v4();
    let audio_path = fsnames::job_scoped_path(&state.settings.audio_dir(), job_id, &audio_name);
    let lyrics_path = fsnames::job_scoped_path(&state.settings.lyrics_dir(), job_id, &lyrics_name);

    persist_inputs(&state, &audio_path, &audio.bytes, &lyrics_path, &lyrics.bytes).await?;

    // Validation runs against the stored files; both are removed on any
    // rejection or failure from here on.
    match validate_inputs(&audio_path, &lyrics_path).await {
        Ok(()) => {}
        Err(err) => {
            discard_inputs(&audio_path, &lyrics_path).await;
            return Err(err);
        }
    }

    let payload = JobPayload::Translation(TranslationJob {
        audio_path: audio_path.clone(),
        lyrics_path: lyrics_path.clone(),
        stored_audio_basename: fsnames::job_scoped_name(job_id, &audio_name),
        original_audio_basename: audio_name.clone(),
    });

    if let Err(err) = state
        .broker
        .enqueue(
            TRANSLATION_QUEUE,
            job_id,
            &payload,
            state.settings.job_timeout_secs,
        )
        .await
    {
        discard_inputs(&audio_path, &lyrics_path).await;
        return Err(ApiError::Unavailable(format!(
            "Failed to enqueue translation job: {err}"
        )));
    }

    tracing::info!(
        job_id = %job_id,
        audio = %audio_name,
        lyrics = %lyrics_name,
        "Translation job enqueued"
    );

    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { job_id })))
}

fn authorize(state: &AppState, query: &AccessQuery, headers: &HeaderMap) -> ApiResult<()> {
    let code = query
        .access_code
        .clone()
        .or_else(|| {
            headers
                .get("X-Access-Code")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        })
        .ok_or_else(|| ApiError::Unauthorized("Missing access code.".to_string()))?;

    if !state.settings.access_codes.contains(&code) {
        return Err(ApiError::Unauthorized("Invalid access code.".to_string()));
    }
    Ok(())
}

async fn read_upload_parts(
    mut multipart: Multipart,
) -> ApiResult<(Option<UploadedPart>, Option<UploadedPart>)> {
    let mut audio = None;
    let mut lyrics = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(format!("Malformed multipart body: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::BadRequest(format!("Failed to read upload: {err}")))?;

        match name.as_str() {
            "audio" => audio = Some(UploadedPart { filename, bytes }),
            "lyrics" => lyrics = Some(UploadedPart { filename, bytes }),
            other => {
                tracing::debug!(part = other, "Ignoring unexpected multipart part");
            }
        }
    }

    Ok((audio, lyrics))
}

async fn persist_inputs(
    state: &AppState,
    audio_path: &Path,
    audio_bytes: &[u8],
    lyrics_path: &Path,
    lyrics_bytes: &[u8],
) -> ApiResult<()> {
    tokio::fs::create_dir_all(state.settings.audio_dir()).await?;
    tokio::fs::create_dir_all(state.settings.lyrics_dir()).await?;

    if let Err(err) = tokio::fs::write(audio_path, audio_bytes).await {
        return Err(ApiError::Internal(format!("Failed to store audio: {err}")));
    }
    if let Err(err) = tokio::fs::write(lyrics_path, lyrics_bytes).await {
        discard_inputs(audio_path, lyrics_path).await;
        return Err(ApiError::Internal(format!("Failed to store lyrics: {err}")));
    }
    Ok(())
}

async fn validate_inputs(audio_path: &Path, lyrics_path: &Path) -> ApiResult<()> {
    let audio_ok = validate::is_valid_audio(audio_path)
        .await
        .map_err(|err| ApiError::Internal(format!("Audio validation failed: {err}")))?;
    if !audio_ok {
        return Err(ApiError::BadRequest("Invalid audio file.".to_string()));
    }

    let lyrics_ok = validate::is_valid_lyrics(lyrics_path)
        .await
        .map_err(|err| ApiError::Internal(format!("Lyrics validation failed: {err}")))?;
    if !lyrics_ok {
        return Err(ApiError::BadRequest("Invalid lyrics file.".to_string()));
    }
    Ok(())
}

/// Best-effort removal of persisted inputs after a failed submission.
async fn discard_inputs(audio_path: &Path, lyrics_path: &Path) {
    for path in [audio_path, lyrics_path] {
        if let Err(err) = fsnames::remove_path_if_exists(path).await {
            tracing::warn!(path = %path.display(), error = %err, "Failed to discard rejected upload");
        }
    }
}

/// Build submission routes
pub fn translate_routes() -> Router<AppState> {
    Router::new().route("/api/translate", post(submit_translation))
}
