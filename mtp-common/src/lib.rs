//! # MTP Common Library
//!
//! Shared code for the music translation pipeline services:
//! - Broker (Redis) job store: durable queues, per-job status/result records
//! - Result data model (mapped transcript, F0 series, RMS envelopes)
//! - Configuration loading
//! - Filename sanitation and shared-volume path helpers

pub mod broker;
pub mod config;
pub mod error;
pub mod fsnames;
pub mod types;

pub use broker::{Broker, CleanupJob, JobPayload, JobStatus, TranslationJob};
pub use config::Settings;
pub use error::{Error, Result};
