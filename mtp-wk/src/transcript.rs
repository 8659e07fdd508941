//! Transcript mapper: alignment JSON + lyrics text → line-structured output
//!
//! A pure function over two files on the shared volume. Lyric tokens are
//! matched against the aligner's word entries with a single forward-only
//! cursor, which keeps the mapping linear in the input sizes and binds
//! repeated words to their first forward occurrence. A matched token
//! consumes its entry; an unmatched token consumes nothing, so one
//! out-of-vocabulary word cannot eat through later alignments.

use mtp_common::types::{AlignmentDocument, MappedLine, MappedWord};
use std::path::Path;
use thiserror::Error;

/// Mapper errors: both amount to "this input cannot be mapped at all".
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("Failed to read lyrics file {path}: {source}")]
    LyricsUnreadable {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to read alignment file {path}: {source}")]
    AlignmentUnreadable {
        path: String,
        source: std::io::Error,
    },

    #[error("Alignment file {path} is not valid JSON: {source}")]
    AlignmentInvalid {
        path: String,
        source: serde_json::Error,
    },
}

/// One lyrics line: the text as written plus its normalized tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine {
    pub original_text: String,
    pub word_list: Vec<String>,
}

/// Normalize a token for matching: lowercase, then strip the punctuation
/// characters `.,!?;:` from both ends. Inner punctuation stays.
pub fn normalize_token(token: &str) -> String {
    token
        .to_lowercase()
        .trim_matches(|c: char| matches!(c, '.' | ',' | '!' | '?' | ';' | ':'))
        .to_string()
}

/// Read and tokenize a lyrics file.
///
/// Blank lines are elided; a line whose tokens all normalize to nothing
/// (for example a line of punctuation) is dropped as well.
pub fn process_lyrics(lyrics_path: &Path) -> Result<Vec<LyricLine>, TranscriptError> {
    let contents =
        std::fs::read_to_string(lyrics_path).map_err(|source| TranscriptError::LyricsUnreadable {
            path: lyrics_path.display().to_string(),
            source,
        })?;

    let mut lines = Vec::new();
    for raw_line in contents.lines() {
        let original_text = raw_line.trim();
        if original_text.is_empty() {
            continue;
        }

        let word_list: Vec<String> = original_text
            .split_whitespace()
            .map(normalize_token)
            .filter(|word| !word.is_empty())
            .collect();

        if word_list.is_empty() {
            continue;
        }

        lines.push(LyricLine {
            original_text: original_text.to_string(),
            word_list,
        });
    }
    Ok(lines)
}

/// An alignment entry with its normalized form precomputed.
struct TimedWord {
    word: String,
    normalized: String,
    start: Option<f64>,
    end: Option<f64>,
}

fn load_timed_words(alignment_json_path: &Path) -> Result<Vec<TimedWord>, TranscriptError> {
    let contents = std::fs::read_to_string(alignment_json_path).map_err(|source| {
        TranscriptError::AlignmentUnreadable {
            path: alignment_json_path.display().to_string(),
            source,
        }
    })?;

    let document: AlignmentDocument =
        serde_json::from_str(&contents).map_err(|source| TranscriptError::AlignmentInvalid {
            path: alignment_json_path.display().to_string(),
            source,
        })?;

    // Entries whose word normalizes to nothing (silence markers, bare
    // punctuation) carry no matchable token and are dropped up front.
    Ok(document
        .tiers
        .words
        .entries
        .into_iter()
        .filter_map(|entry| {
            let normalized = normalize_token(entry.word());
            if normalized.is_empty() {
                return None;
            }
            Some(TimedWord {
                word: entry.word().to_string(),
                normalized,
                start: entry.start(),
                end: entry.end(),
            })
        })
        .collect())
}

/// Map the aligner's word timings onto the lyrics, line by line.
///
/// Errors only when a file is unreadable or the alignment is not valid
/// JSON; lyric tokens without a matching entry come back untimed.
pub fn map_transcript(
    alignment_json_path: &Path,
    lyrics_path: &Path,
) -> Result<Vec<MappedLine>, TranscriptError> {
    let entries = load_timed_words(alignment_json_path)?;
    let lines = process_lyrics(lyrics_path)?;

    let mut mapped = Vec::with_capacity(lines.len());
    let mut cursor = 0usize;

    for line in lines {
        let mut words = Vec::with_capacity(line.word_list.len());
        let mut line_start: Option<f64> = None;
        let mut line_end: Option<f64> = None;

        // The line-local search index; committed back to the cursor once
        // the whole line is processed so later lines never rewind.
        let mut next_search = cursor;

        for token in &line.word_list {
            let mut matched = false;
            let mut index = next_search;

            while index < entries.len() {
                let entry = &entries[index];
                if entry.normalized == *token {
                    words.push(MappedWord {
                        word: entry.word.clone(),
                        start: entry.start,
                        end: entry.end,
                    });
                    if let Some(start) = entry.start {
                        line_start = Some(line_start.map_or(start, |current| current.min(start)));
                    }
                    if let Some(end) = entry.end {
                        line_end = Some(line_end.map_or(end, |current| current.max(end)));
                    }
                    next_search = index + 1;
                    matched = true;
                    break;
                }
                index += 1;
            }

            if !matched {
                words.push(MappedWord {
                    word: token.clone(),
                    start: None,
                    end: None,
                });
            }
        }

        cursor = next_search;

        // Tokenization already guarantees at least one word here; the guard
        // stays so an empty line can never produce an empty record.
        if !words.is_empty() {
            mapped.push(MappedLine {
                line_text: line.original_text,
                words,
                line_start_time: line_start,
                line_end_time: line_end,
            });
        }
    }

    Ok(mapped)
}
