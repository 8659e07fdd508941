//! Job records stored in the broker
//!
//! A job is a Redis hash `job:{id}` plus an id entry on one of the queue
//! lists. The hash carries the payload, a monotonic status, the worker's
//! free-form progress stage, and either a result or an exception message
//! once the job reaches a terminal state.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Queue consumed by translation workers.
pub const TRANSLATION_QUEUE: &str = "translations";

/// Queue of post-success artifact removals.
pub const CLEANUP_QUEUE: &str = "cleanup_files";

/// Monotonic job lifecycle: queued → started → finished | failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Started,
    Finished,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Started => "started",
            JobStatus::Finished => "finished",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "queued" => Some(JobStatus::Queued),
            "started" => Some(JobStatus::Started),
            "finished" => Some(JobStatus::Finished),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// Terminal jobs never transition again and are subject to retention.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Failed)
    }
}

/// Payload of a translation job, created by the gateway at submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationJob {
    /// Uploaded audio on the shared volume
    pub audio_path: PathBuf,
    /// Uploaded lyrics transcript on the shared volume
    pub lyrics_path: PathBuf,
    /// Job-scoped audio basename, also the playback artifact name
    pub stored_audio_basename: String,
    /// The basename the client supplied
    pub original_audio_basename: String,
}

/// Payload of a cleanup job, enqueued by the worker after a success.
///
/// The audio input is deliberately absent: it stays on the volume for
/// playback until the client deletes it through the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupJob {
    pub lyrics_path: PathBuf,
    pub alignment_path: PathBuf,
    pub stems_dir: PathBuf,
}

/// Discriminated job payload as stored in the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobPayload {
    Translation(TranslationJob),
    Cleanup(CleanupJob),
}

/// A job handed to a worker by the queue.
#[derive(Debug, Clone)]
pub struct DequeuedJob {
    pub job_id: Uuid,
    pub queue: String,
    pub payload: JobPayload,
    /// Processing budget recorded at enqueue time, seconds
    pub timeout_secs: u64,
}

/// Snapshot of a job's broker record, as read by the gateway poller.
#[derive(Debug, Clone)]
pub struct JobState {
    pub status: Option<JobStatus>,
    pub progress_stage: Option<String>,
    pub exc_info: Option<String>,
    /// Stored result, parsed; `None` when absent or unparseable
    pub result: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            JobStatus::Queued,
            JobStatus::Started,
            JobStatus::Finished,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("running"), None);
    }

    #[test]
    fn payload_serialization_is_tagged_by_kind() {
        let payload = JobPayload::Translation(TranslationJob {
            audio_path: PathBuf::from("/shared-data/audio/id_song.wav"),
            lyrics_path: PathBuf::from("/shared-data/lyrics/id_song.txt"),
            stored_audio_basename: "id_song.wav".to_string(),
            original_audio_basename: "song.wav".to_string(),
        });

        let encoded = serde_json::to_string(&payload).unwrap();
        assert!(encoded.contains("\"kind\":\"translation\""));

        let decoded: JobPayload = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn cleanup_payload_round_trips() {
        let payload = JobPayload::Cleanup(CleanupJob {
            lyrics_path: PathBuf::from("/shared-data/lyrics/id_song.txt"),
            alignment_path: PathBuf::from("/shared-data/aligned/id_song.json"),
            stems_dir: PathBuf::from("/shared-data/separator_output/htdemucs_6s/id_song"),
        });
        let encoded = serde_json::to_string(&payload).unwrap();
        let decoded: JobPayload = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, payload);
    }
}
