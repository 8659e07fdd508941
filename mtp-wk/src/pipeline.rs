//! Translation pipeline: the per-job DAG
//!
//! ```text
//! [audio,lyrics] ─► separate ─► {vocals, bass, drums, guitar, piano, other}
//!                         │
//!                         ├─► align(vocals, lyrics)   ┐
//!                         ├─► f0(tonal stems)         │ concurrent,
//!                         ├─► rms(song + stems)       │ joined before mapping
//!                         └─► drums(drums stem)       ┘
//!                                    │
//!                         map(alignment, lyrics) ─► assemble ─► Result
//! ```
//!
//! Separation and alignment are the critical path: their failures fail the
//! job. F0, RMS and drum analyses degrade in-band instead, so a flaky
//! analyzer cannot cost the client a finished transcript.

use mtp_common::broker::{Broker, CleanupJob, TranslationJob};
use mtp_common::types::{
    AnalysisUnavailable, DrumAnalysis, F0Analysis, TranslationResult, VolumeAnalysis,
};
use mtp_common::Settings;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::services::{
    AlignerClient, DrumClient, F0Client, F0Outcome, RmsClient, SeparatorClient, ServiceError,
};
use crate::transcript;

const STAGE_SEPARATING: &str = "separating_audio";
const STAGE_STEM_PROCESSING: &str = "stem_processing";
const STAGE_MAPPING: &str = "mapping_transcript";

const F0_DEGRADED_INFO: &str = "F0 analysis did not complete successfully.";
const VOLUME_DEGRADED_INFO: &str = "Volume analysis did not complete successfully.";
const DRUM_DEGRADED_INFO: &str = "Drum analysis did not complete successfully.";

/// Fatal pipeline failures; the message becomes the job's `exc_info`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Stem separation failed: {0}")]
    Separation(String),

    #[error("Separator response did not include a vocals stem")]
    MissingVocals,

    #[error("Vocals stem not found on the shared volume: {0}")]
    VocalsMissingOnDisk(String),

    #[error("Lyric alignment failed: {0}")]
    Alignment(String),

    #[error("Transcript mapping failed: {0}")]
    Mapping(String),

    #[error("Transcript mapping produced no lines")]
    EmptyTranscript,
}

/// A successful pipeline run: the client-facing result plus the cleanup
/// work it left behind on the shared volume.
#[derive(Debug)]
pub struct PipelineOutput {
    pub result: TranslationResult,
    pub cleanup: CleanupJob,
}

/// Executes translation jobs against the analyzer mesh.
pub struct TranslationPipeline {
    broker: Arc<Broker>,
    separator: SeparatorClient,
    aligner: AlignerClient,
    f0: F0Client,
    rms: RmsClient,
    drums: DrumClient,
}

impl TranslationPipeline {
    pub fn new(settings: &Settings, broker: Arc<Broker>) -> Result<Self, ServiceError> {
        let timeout = Duration::from_secs(settings.service_timeout_secs);
        Ok(Self {
            broker,
            separator: SeparatorClient::new(&settings.separator_url, timeout)?,
            aligner: AlignerClient::new(&settings.aligner_url, timeout)?,
            f0: F0Client::new(&settings.f0_url, timeout)?,
            rms: RmsClient::new(&settings.rms_url, timeout)?,
            drums: DrumClient::new(&settings.drum_url, timeout)?,
        })
    }

    /// Run the full DAG for one job.
    pub async fn run(
        &self,
        job_id: Uuid,
        job: &TranslationJob,
    ) -> Result<PipelineOutput, PipelineError> {
        // Stage 1: stem separation. Fatal without a usable vocals stem,
        // since alignment has nothing to work with.
        self.report_stage(job_id, STAGE_SEPARATING).await;
        let stems = self
            .separator
            .separate(&job.stored_audio_basename)
            .await
            .map_err(|err| PipelineError::Separation(err.message()))?;

        let vocals_path = stems
            .get("vocals")
            .cloned()
            .ok_or(PipelineError::MissingVocals)?;
        if !tokio::fs::try_exists(&vocals_path).await.unwrap_or(false) {
            return Err(PipelineError::VocalsMissingOnDisk(
                vocals_path.display().to_string(),
            ));
        }
        let stems_dir = vocals_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .to_path_buf();

        // Stage 2: alignment plus the three analyzers, concurrently.
        // Mapping must not start before every branch has terminated.
        self.report_stage(job_id, STAGE_STEM_PROCESSING).await;

        let mut rms_inputs: BTreeMap<String, PathBuf> = stems.clone();
        rms_inputs.insert("song".to_string(), job.audio_path.clone());
        let drums_path = stems.get("drums").cloned();

        let (alignment, f0_outcome, rms_outcome, drum_outcome) = tokio::join!(
            self.aligner.align(&vocals_path, &job.lyrics_path),
            self.f0.analyze(&stems),
            self.rms.analyze(&rms_inputs),
            self.analyze_drums(drums_path.as_deref()),
        );

        // Alignment is the critical path; everything else degrades in-band.
        let alignment_path =
            alignment.map_err(|err| PipelineError::Alignment(err.message()))?;

        let f0_analysis = match f0_outcome {
            Ok(F0Outcome::Analyzed(series)) => F0Analysis::Stems(series),
            Ok(F0Outcome::Skipped { info }) => {
                F0Analysis::Unavailable(AnalysisUnavailable::skipped(info))
            }
            Err(err) => {
                tracing::warn!(job_id = %job_id, error = %err, "F0 analysis degraded");
                F0Analysis::Unavailable(AnalysisUnavailable::failed(
                    err.message(),
                    F0_DEGRADED_INFO,
                ))
            }
        };

        let volume_analysis = match rms_outcome {
            Ok(analysis) => VolumeAnalysis::Rms(analysis),
            Err(err) => {
                tracing::warn!(job_id = %job_id, error = %err, "Volume analysis degraded");
                VolumeAnalysis::Unavailable(AnalysisUnavailable::failed(
                    err.message(),
                    VOLUME_DEGRADED_INFO,
                ))
            }
        };

        let drum_analysis = match drum_outcome {
            Ok(Some(hits)) => DrumAnalysis::Onsets(hits),
            Ok(None) => DrumAnalysis::Unavailable(AnalysisUnavailable::skipped(
                "No drums stem was submitted for onset analysis.",
            )),
            Err(err) => {
                tracing::warn!(job_id = %job_id, error = %err, "Drum analysis degraded");
                DrumAnalysis::Unavailable(AnalysisUnavailable::failed(
                    err.message(),
                    DRUM_DEGRADED_INFO,
                ))
            }
        };

        // Stage 3: map the alignment onto the lyrics.
        self.report_stage(job_id, STAGE_MAPPING).await;
        let mapped_result = {
            let alignment = alignment_path.clone();
            let lyrics = job.lyrics_path.clone();
            tokio::task::spawn_blocking(move || transcript::map_transcript(&alignment, &lyrics))
                .await
                .map_err(|err| PipelineError::Mapping(format!("mapper task failed: {err}")))?
                .map_err(|err| PipelineError::Mapping(err.to_string()))?
        };
        if mapped_result.is_empty() {
            return Err(PipelineError::EmptyTranscript);
        }

        // Stage 4: assemble.
        let result = TranslationResult {
            mapped_result,
            f0_analysis,
            volume_analysis,
            drum_analysis,
            audio_url: format!("api/files/{}", job.stored_audio_basename),
            original_filename: job.original_audio_basename.clone(),
        };

        Ok(PipelineOutput {
            result,
            cleanup: CleanupJob {
                lyrics_path: job.lyrics_path.clone(),
                alignment_path,
                stems_dir,
            },
        })
    }

    async fn analyze_drums(
        &self,
        drums_path: Option<&Path>,
    ) -> Result<Option<Vec<mtp_common::types::DrumHit>>, ServiceError> {
        match drums_path {
            Some(path) => Ok(Some(self.drums.analyze(path).await?)),
            None => Ok(None),
        }
    }

    /// Progress is advisory; a broker hiccup here must not fail the job.
    async fn report_stage(&self, job_id: Uuid, stage: &str) {
        if let Err(err) = self.broker.set_progress_stage(job_id, stage).await {
            tracing::warn!(job_id = %job_id, stage, error = %err, "Failed to record progress stage");
        }
    }
}
