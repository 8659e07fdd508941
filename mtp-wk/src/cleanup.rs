//! Cleanup job execution
//!
//! Removes the intermediate artifacts a finished translation left on the
//! shared volume: the lyrics transcript, the alignment document, and the
//! separator's stem directory. The uploaded audio is never touched here;
//! playback needs it until the client deletes it through the gateway.
//!
//! Cleanup failures are logged and swallowed - a leftover file is an
//! operations concern, not something to surface to the client.

use mtp_common::broker::CleanupJob;
use mtp_common::fsnames;

/// Remove each artifact named by the cleanup job, if it still exists.
pub async fn run_cleanup(job: &CleanupJob) {
    for path in [&job.lyrics_path, &job.alignment_path, &job.stems_dir] {
        match fsnames::remove_path_if_exists(path).await {
            Ok(true) => {
                tracing::info!(path = %path.display(), "Removed intermediate artifact");
            }
            Ok(false) => {
                tracing::debug!(path = %path.display(), "Artifact already absent");
            }
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Failed to remove intermediate artifact"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn cleanup_removes_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let lyrics = dir.path().join("lyrics/job_song.txt");
        let alignment = dir.path().join("aligned/job_song.json");
        let stems = dir.path().join("separator_output/htdemucs_6s/job_song");

        tokio::fs::create_dir_all(lyrics.parent().unwrap()).await.unwrap();
        tokio::fs::create_dir_all(alignment.parent().unwrap()).await.unwrap();
        tokio::fs::create_dir_all(&stems).await.unwrap();
        tokio::fs::write(&lyrics, "la la").await.unwrap();
        tokio::fs::write(&alignment, "{}").await.unwrap();
        tokio::fs::write(stems.join("vocals.wav"), b"riff").await.unwrap();

        let job = CleanupJob {
            lyrics_path: lyrics.clone(),
            alignment_path: alignment.clone(),
            stems_dir: stems.clone(),
        };
        run_cleanup(&job).await;

        assert!(!lyrics.exists());
        assert!(!alignment.exists());
        assert!(!stems.exists());
    }

    #[tokio::test]
    async fn cleanup_tolerates_missing_paths() {
        let job = CleanupJob {
            lyrics_path: PathBuf::from("/nonexistent/lyrics.txt"),
            alignment_path: PathBuf::from("/nonexistent/alignment.json"),
            stems_dir: PathBuf::from("/nonexistent/stems"),
        };
        // Must not panic or error out.
        run_cleanup(&job).await;
    }
}
