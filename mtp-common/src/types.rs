//! Result data model shared between the worker and the gateway
//!
//! The worker assembles a [`TranslationResult`] and stores it as the job
//! result; the gateway returns it verbatim to pollers. The analyzer outputs
//! are sum types discriminated by shape: a successful analysis serializes as
//! its payload, a degraded one as an `{error?, info}` record, matching the
//! wire convention of the analyzer services.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One word of a lyric line, with aligner timing when known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedWord {
    /// The aligner's token when matched (preserving its casing),
    /// otherwise the normalized lyric token.
    pub word: String,
    pub start: Option<f64>,
    pub end: Option<f64>,
}

/// One lyric line with per-word timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedLine {
    /// The original line as written, stripped of surrounding whitespace.
    pub line_text: String,
    pub words: Vec<MappedWord>,
    /// Minimum known word start in the line, if any word carries timing.
    pub line_start_time: Option<f64>,
    /// Maximum known word end in the line, if any word carries timing.
    pub line_end_time: Option<f64>,
}

/// Fundamental frequency curve for one stem.
///
/// `times` and `f0_values` have identical length; `None` marks an unvoiced
/// analysis frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct F0Series {
    pub times: Vec<f64>,
    pub f0_values: Vec<Option<f64>>,
    pub time_interval: f64,
}

/// Degradation record substituted for an analysis that did not complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisUnavailable {
    /// Classified error message, absent when the analysis was merely skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub info: String,
}

impl AnalysisUnavailable {
    pub fn skipped(info: impl Into<String>) -> Self {
        Self {
            error: None,
            info: info.into(),
        }
    }

    pub fn failed(error: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            info: info.into(),
        }
    }
}

/// F0 analysis outcome: per-instrument curves, or a degradation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum F0Analysis {
    Stems(BTreeMap<String, Option<F0Series>>),
    Unavailable(AnalysisUnavailable),
}

/// RMS envelope for a single instrument stem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRms {
    /// `[timestamp, rms]` pairs.
    pub rms_values: Vec<(f64, f64)>,
}

/// Response body of the RMS analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RmsAnalysis {
    /// `[timestamp, rms]` pairs for the full mix.
    pub overall_rms: Vec<(f64, f64)>,
    pub instruments: BTreeMap<String, InstrumentRms>,
    /// Per-file analyzer complaints; the analysis as a whole still succeeded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Volume analysis outcome: RMS envelopes, or a degradation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VolumeAnalysis {
    Rms(RmsAnalysis),
    Unavailable(AnalysisUnavailable),
}

/// One detected percussive event from the drum analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrumHit {
    pub onset_time: f64,
    pub duration: f64,
    pub relative_volume: f64,
    pub dominant_frequency: f64,
    pub spectral_centroid: f64,
    pub spectral_rolloff: f64,
    pub spectral_flux: f64,
    pub mfccs: Vec<f64>,
}

/// Drum onset analysis outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DrumAnalysis {
    Onsets(Vec<DrumHit>),
    Unavailable(AnalysisUnavailable),
}

/// The canonical job result returned to pollers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub mapped_result: Vec<MappedLine>,
    pub f0_analysis: F0Analysis,
    pub volume_analysis: VolumeAnalysis,
    pub drum_analysis: DrumAnalysis,
    /// Relative URL the original audio can be fetched from for playback.
    pub audio_url: String,
    /// The user-supplied audio basename.
    pub original_filename: String,
}

/// One entry of the aligner's `words` tier: `[start, end, word]`.
/// Start and end are `null` for entries the aligner could not time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentEntry(pub Option<f64>, pub Option<f64>, pub String);

impl AlignmentEntry {
    pub fn start(&self) -> Option<f64> {
        self.0
    }

    pub fn end(&self) -> Option<f64> {
        self.1
    }

    pub fn word(&self) -> &str {
        &self.2
    }
}

/// Alignment document produced by the forced aligner.
///
/// Missing tiers deserialize as empty, which maps every lyric token to an
/// untimed placeholder instead of rejecting the document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlignmentDocument {
    #[serde(default)]
    pub tiers: AlignmentTiers,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlignmentTiers {
    #[serde(default)]
    pub words: AlignmentTier,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlignmentTier {
    #[serde(default)]
    pub entries: Vec<AlignmentEntry>,
}
