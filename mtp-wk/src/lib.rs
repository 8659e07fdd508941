//! mtp-wk library interface
//!
//! Exposes the pipeline, transcript mapper, and service clients so
//! integration tests can exercise them without a broker.

pub mod cleanup;
pub mod pipeline;
pub mod services;
pub mod transcript;
pub mod worker;

pub use pipeline::{PipelineError, PipelineOutput, TranslationPipeline};
pub use worker::Worker;
