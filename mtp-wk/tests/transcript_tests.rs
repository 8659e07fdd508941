//! Integration tests for the transcript mapper
//!
//! Exercises tokenization, the forward-only matching cursor, and the
//! line-timing computation against real files on disk.

use mtp_wk::transcript::{map_transcript, process_lyrics, TranscriptError};
use serde_json::json;
use std::path::{Path, PathBuf};

fn write_lyrics(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("lyrics.txt");
    std::fs::write(&path, text).unwrap();
    path
}

fn write_alignment(dir: &Path, entries: serde_json::Value) -> PathBuf {
    let path = dir.join("alignment.json");
    let document = json!({"tiers": {"words": {"entries": entries}}});
    std::fs::write(&path, document.to_string()).unwrap();
    path
}

#[test]
fn maps_two_simple_lines() {
    let dir = tempfile::tempdir().unwrap();
    let lyrics = write_lyrics(dir.path(), "hello world\ntest sentence");
    let alignment = write_alignment(
        dir.path(),
        json!([
            [0.1, 0.5, "hello"],
            [0.6, 1.0, "world"],
            [1.1, 1.5, "test"],
            [1.6, 2.0, "sentence"]
        ]),
    );

    let mapped = map_transcript(&alignment, &lyrics).unwrap();
    assert_eq!(mapped.len(), 2);

    let first = &mapped[0];
    assert_eq!(first.line_text, "hello world");
    assert_eq!(first.words.len(), 2);
    assert_eq!(first.words[0].word, "hello");
    assert_eq!(first.words[0].start, Some(0.1));
    assert_eq!(first.words[0].end, Some(0.5));
    assert_eq!(first.words[1].word, "world");
    assert_eq!(first.line_start_time, Some(0.1));
    assert_eq!(first.line_end_time, Some(1.0));

    let second = &mapped[1];
    assert_eq!(second.line_text, "test sentence");
    assert_eq!(second.line_start_time, Some(1.1));
    assert_eq!(second.line_end_time, Some(2.0));
}

#[test]
fn untimed_entries_keep_their_words_but_not_times() {
    let dir = tempfile::tempdir().unwrap();
    let lyrics = write_lyrics(dir.path(), "hello different test word sentence");
    let alignment = write_alignment(
        dir.path(),
        json!([
            [0.1, 0.5, "hello"],
            [null, null, "different"],
            [1.1, 1.5, "test"],
            [null, null, "word"],
            [1.6, 2.0, "sentence"]
        ]),
    );

    let mapped = map_transcript(&alignment, &lyrics).unwrap();
    assert_eq!(mapped.len(), 1);

    let line = &mapped[0];
    assert_eq!(line.words.len(), 5);
    assert_eq!(line.words[1].word, "different");
    assert_eq!(line.words[1].start, None);
    assert_eq!(line.words[1].end, None);
    assert_eq!(line.words[3].word, "word");
    assert_eq!(line.words[3].start, None);
    // Untimed words do not contribute to the line window.
    assert_eq!(line.line_start_time, Some(0.1));
    assert_eq!(line.line_end_time, Some(2.0));
}

#[test]
fn empty_alignment_entries_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let lyrics = write_lyrics(dir.path(), "hello test sentence");

    let with_empties = write_alignment(
        dir.path(),
        json!([
            [0.1, 0.5, "hello"],
            [0.6, 1.0, ""],
            [1.1, 1.5, "test"],
            [1.6, 2.0, "sentence"],
            [2.1, 2.5, ""]
        ]),
    );
    let mapped = map_transcript(&with_empties, &lyrics).unwrap();

    let without_path = dir.path().join("clean.json");
    std::fs::write(
        &without_path,
        json!({"tiers": {"words": {"entries": [
            [0.1, 0.5, "hello"],
            [1.1, 1.5, "test"],
            [1.6, 2.0, "sentence"]
        ]}}})
        .to_string(),
    )
    .unwrap();
    let mapped_clean = map_transcript(&without_path, &lyrics).unwrap();

    assert_eq!(mapped, mapped_clean);
    assert_eq!(mapped[0].words.len(), 3);
    assert!(mapped[0].words.iter().all(|w| w.start.is_some()));
}

#[test]
fn punctuation_and_casing_match_with_aligner_output_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let lyrics = write_lyrics(dir.path(), "Hello, World!\nTEST sentence.");
    let alignment = write_alignment(
        dir.path(),
        json!([
            [0.1, 0.5, "hello"],
            [0.6, 1.0, "world"],
            [1.1, 1.5, "test"],
            [1.6, 2.0, "sentence"]
        ]),
    );

    let mapped = map_transcript(&alignment, &lyrics).unwrap();
    assert_eq!(mapped.len(), 2);

    // The line keeps the original text; the words carry the aligner's casing.
    assert_eq!(mapped[0].line_text, "Hello, World!");
    assert_eq!(mapped[0].words[0].word, "hello");
    assert_eq!(mapped[0].words[1].word, "world");
    assert_eq!(mapped[1].line_text, "TEST sentence.");
    assert_eq!(mapped[1].words[0].word, "test");
    assert_eq!(mapped[1].words[0].start, Some(1.1));
}

#[test]
fn repeated_token_binds_forward_only() {
    let dir = tempfile::tempdir().unwrap();
    let lyrics = write_lyrics(dir.path(), "la la band");
    let alignment = write_alignment(
        dir.path(),
        json!([
            [0.1, 0.2, "la"],
            [0.5, 0.6, "band"]
        ]),
    );

    let mapped = map_transcript(&alignment, &lyrics).unwrap();
    let words = &mapped[0].words;
    assert_eq!(words.len(), 3);

    // First occurrence consumes the only "la" entry; the second finds
    // nothing ahead of the cursor and stays untimed.
    assert_eq!(words[0].start, Some(0.1));
    assert_eq!(words[1].start, None);
    assert_eq!(words[2].word, "band");
    assert_eq!(words[2].start, Some(0.5));
}

#[test]
fn cursor_never_rewinds_across_lines() {
    let dir = tempfile::tempdir().unwrap();
    let lyrics = write_lyrics(dir.path(), "oh yeah\noh no");
    let alignment = write_alignment(
        dir.path(),
        json!([
            [0.0, 0.1, "oh"],
            [0.2, 0.3, "yeah"],
            [0.4, 0.5, "oh"],
            [0.6, 0.7, "no"]
        ]),
    );

    let mapped = map_transcript(&alignment, &lyrics).unwrap();
    assert_eq!(mapped[0].words[0].start, Some(0.0));
    // The second line's "oh" must bind to the later occurrence.
    assert_eq!(mapped[1].words[0].start, Some(0.4));
    assert_eq!(mapped[1].words[1].start, Some(0.6));

    // Flattened non-null starts are non-decreasing.
    let starts: Vec<f64> = mapped
        .iter()
        .flat_map(|line| line.words.iter().filter_map(|w| w.start))
        .collect();
    assert!(starts.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn failed_match_does_not_consume_entries() {
    let dir = tempfile::tempdir().unwrap();
    // "unknown" is out of vocabulary; "world" must still match the entry
    // the failed scan walked over.
    let lyrics = write_lyrics(dir.path(), "unknown world");
    let alignment = write_alignment(dir.path(), json!([[0.6, 1.0, "world"]]));

    let mapped = map_transcript(&alignment, &lyrics).unwrap();
    let words = &mapped[0].words;
    assert_eq!(words[0].word, "unknown");
    assert_eq!(words[0].start, None);
    assert_eq!(words[1].word, "world");
    assert_eq!(words[1].start, Some(0.6));
}

#[test]
fn blank_and_punctuation_only_lines_are_elided() {
    let dir = tempfile::tempdir().unwrap();
    let lyrics = write_lyrics(dir.path(), "hello world\n\n   \n!!! ...\ntest sentence\n");
    let alignment = write_alignment(dir.path(), json!([]));

    let lines = process_lyrics(&lyrics).unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].original_text, "hello world");
    assert_eq!(lines[1].original_text, "test sentence");

    let mapped = map_transcript(&alignment, &lyrics).unwrap();
    assert_eq!(mapped.len(), 2);
    assert_eq!(mapped[0].words.len(), 2);
    assert!(mapped.iter().all(|line| line.line_start_time.is_none()));
}

#[test]
fn inline_punctuation_tokens_are_dropped_from_word_lists() {
    let dir = tempfile::tempdir().unwrap();
    let lyrics = write_lyrics(dir.path(), "hello !!! world");
    let alignment = write_alignment(
        dir.path(),
        json!([[0.1, 0.5, "hello"], [0.6, 1.0, "world"]]),
    );

    let mapped = map_transcript(&alignment, &lyrics).unwrap();
    assert_eq!(mapped[0].words.len(), 2);
    assert_eq!(mapped[0].words[1].word, "world");
}

#[test]
fn mapping_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let lyrics = write_lyrics(dir.path(), "hello world\ntest sentence");
    let alignment = write_alignment(
        dir.path(),
        json!([
            [0.1, 0.5, "hello"],
            [0.6, 1.0, "world"],
            [1.1, 1.5, "test"],
            [1.6, 2.0, "sentence"]
        ]),
    );

    let first = map_transcript(&alignment, &lyrics).unwrap();
    let second = map_transcript(&alignment, &lyrics).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn alignment_without_tiers_maps_everything_untimed() {
    let dir = tempfile::tempdir().unwrap();
    let lyrics = write_lyrics(dir.path(), "hello world");
    let alignment = dir.path().join("alignment.json");
    std::fs::write(&alignment, "{}").unwrap();

    let mapped = map_transcript(&alignment, &lyrics).unwrap();
    assert_eq!(mapped.len(), 1);
    assert!(mapped[0].words.iter().all(|w| w.start.is_none()));
    assert_eq!(mapped[0].line_start_time, None);
    assert_eq!(mapped[0].line_end_time, None);
}

#[test]
fn unreadable_inputs_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let lyrics = write_lyrics(dir.path(), "hello");
    let alignment = write_alignment(dir.path(), json!([]));

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        map_transcript(&missing, &lyrics),
        Err(TranscriptError::AlignmentUnreadable { .. })
    ));

    let missing_lyrics = dir.path().join("missing.txt");
    assert!(matches!(
        map_transcript(&alignment, &missing_lyrics),
        Err(TranscriptError::LyricsUnreadable { .. })
    ));

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "not json {").unwrap();
    assert!(matches!(
        map_transcript(&garbage, &lyrics),
        Err(TranscriptError::AlignmentInvalid { .. })
    ));
}
