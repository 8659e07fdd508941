//! Filename sanitation and shared-volume path helpers
//!
//! Inputs for a job live at deterministic, job-scoped paths so that every
//! service sharing the volume can derive them without a lookup table.

use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Strip any path components from a client-supplied filename.
///
/// Returns `None` when nothing usable remains (empty input, bare separators,
/// `.` or `..`). Both separator styles are stripped since uploads can come
/// from any client platform.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    if base.is_empty() || base == "." || base == ".." {
        return None;
    }
    Some(base)
}

/// Job-scoped storage name: `{job_id}_{original}`.
pub fn job_scoped_name(job_id: Uuid, original: &str) -> String {
    format!("{job_id}_{original}")
}

/// Deterministic storage path for a job input inside `dir`.
pub fn job_scoped_path(dir: &Path, job_id: Uuid, original: &str) -> PathBuf {
    dir.join(job_scoped_name(job_id, original))
}

/// Remove a path if it exists, recursing into directories.
///
/// Returns whether anything was removed. A missing path is not an error so
/// cleanup stays idempotent.
pub async fn remove_path_if_exists(path: &Path) -> std::io::Result<bool> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };

    if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await?;
    } else {
        tokio::fs::remove_file(path).await?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_plain_names() {
        assert_eq!(sanitize_filename("song.wav"), Some("song.wav".to_string()));
        assert_eq!(
            sanitize_filename("My Song (live).flac"),
            Some("My Song (live).flac".to_string())
        );
    }

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(
            sanitize_filename("/tmp/evil/song.wav"),
            Some("song.wav".to_string())
        );
        assert_eq!(
            sanitize_filename("..\\..\\song.wav"),
            Some("song.wav".to_string())
        );
        assert_eq!(
            sanitize_filename("../../etc/passwd"),
            Some("passwd".to_string())
        );
    }

    #[test]
    fn sanitize_rejects_unusable_names() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("   "), None);
        assert_eq!(sanitize_filename("/"), None);
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename("dir/.."), None);
    }

    #[tokio::test]
    async fn remove_path_handles_files_dirs_and_absence() {
        let dir = tempfile::tempdir().unwrap();

        let file = dir.path().join("a.txt");
        tokio::fs::write(&file, b"x").await.unwrap();
        assert!(remove_path_if_exists(&file).await.unwrap());
        assert!(!remove_path_if_exists(&file).await.unwrap());

        let sub = dir.path().join("stems");
        tokio::fs::create_dir_all(sub.join("inner")).await.unwrap();
        tokio::fs::write(sub.join("inner/v.wav"), b"x").await.unwrap();
        assert!(remove_path_if_exists(&sub).await.unwrap());
        assert!(!sub.exists());
    }
}
