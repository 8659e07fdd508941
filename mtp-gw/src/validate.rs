//! Uploaded-file validation
//!
//! Both checks run against the file already persisted on the shared volume
//! so that what was validated is exactly what the worker will read.

use std::path::Path;
use tokio::io::AsyncReadExt;

/// Bytes of file head inspected for an audio signature. Every format infer
/// recognizes declares itself well within this window.
const SNIFF_LEN: usize = 8192;

/// Check that the stored file carries a known audio signature.
pub async fn is_valid_audio(path: &Path) -> std::io::Result<bool> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut head = vec![0u8; SNIFF_LEN];
    let mut filled = 0;
    loop {
        let n = file.read(&mut head[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
        if filled == head.len() {
            break;
        }
    }
    head.truncate(filled);

    Ok(matches!(
        infer::get(&head),
        Some(kind) if kind.matcher_type() == infer::MatcherType::Audio
    ))
}

/// Check that the stored lyrics file is non-empty plain text.
///
/// UTF-8 with no NUL bytes; control characters like tabs are fine, binary
/// uploads masquerading as text are not.
pub async fn is_valid_lyrics(path: &Path) -> std::io::Result<bool> {
    let bytes = tokio::fs::read(path).await?;
    if bytes.is_empty() || bytes.contains(&0) {
        return Ok(false);
    }
    Ok(std::str::from_utf8(&bytes).is_ok())
}
