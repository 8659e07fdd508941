//! Queue consumer: dequeues jobs and drives the pipeline
//!
//! One worker processes one job at a time; horizontal scaling is a matter
//! of running more worker processes against the same broker, which hands
//! each job to exactly one of them.

use mtp_common::broker::{
    Broker, DequeuedJob, JobPayload, TranslationJob, CLEANUP_QUEUE, TRANSLATION_QUEUE,
};
use mtp_common::Settings;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::cleanup;
use crate::pipeline::TranslationPipeline;

/// How long a blocking dequeue waits before cycling. Short enough that a
/// shutdown signal is honored promptly.
const DEQUEUE_BLOCK_SECS: f64 = 5.0;

/// Pause after a broker error before the loop retries.
const RECONNECT_PAUSE: Duration = Duration::from_secs(5);

/// Broker connection attempts at startup before giving up.
const STARTUP_RETRIES: u32 = 5;

/// A translation worker bound to one broker.
pub struct Worker {
    broker: Arc<Broker>,
    pipeline: TranslationPipeline,
    /// Fallback processing budget for jobs enqueued without one.
    default_timeout_secs: u64,
}

impl Worker {
    pub fn new(settings: &Settings, broker: Arc<Broker>) -> anyhow::Result<Self> {
        let pipeline = TranslationPipeline::new(settings, broker.clone())
            .map_err(|err| anyhow::anyhow!("Failed to build service clients: {err}"))?;
        Ok(Self {
            broker,
            pipeline,
            default_timeout_secs: settings.job_timeout_secs,
        })
    }

    /// Verify the broker is reachable, retrying a few times at startup.
    pub async fn connect_with_retries(&self) -> anyhow::Result<()> {
        let mut remaining = STARTUP_RETRIES;
        loop {
            match self.broker.ping().await {
                Ok(()) => {
                    tracing::info!("Worker connected to broker");
                    return Ok(());
                }
                Err(err) => {
                    remaining -= 1;
                    if remaining == 0 {
                        anyhow::bail!(
                            "Could not connect to broker after {STARTUP_RETRIES} attempts: {err}"
                        );
                    }
                    tracing::warn!(
                        error = %err,
                        remaining,
                        "Failed to connect to broker, retrying"
                    );
                    tokio::time::sleep(RECONNECT_PAUSE).await;
                }
            }
        }
    }

    /// Consume jobs forever.
    pub async fn run(&self) -> anyhow::Result<()> {
        tracing::info!(
            queues = ?[TRANSLATION_QUEUE, CLEANUP_QUEUE],
            "Worker started, listening for jobs"
        );

        loop {
            let dequeued = match self
                .broker
                .dequeue(&[TRANSLATION_QUEUE, CLEANUP_QUEUE], DEQUEUE_BLOCK_SECS)
                .await
            {
                Ok(dequeued) => dequeued,
                Err(err) => {
                    tracing::error!(error = %err, "Dequeue failed, backing off");
                    tokio::time::sleep(RECONNECT_PAUSE).await;
                    continue;
                }
            };

            if let Some(job) = dequeued {
                self.handle(job).await;
            }
        }
    }

    async fn handle(&self, job: DequeuedJob) {
        let DequeuedJob {
            job_id,
            queue,
            payload,
            timeout_secs,
        } = job;

        tracing::info!(job_id = %job_id, queue, "Picked up job");
        if let Err(err) = self.broker.mark_started(job_id).await {
            tracing::warn!(job_id = %job_id, error = %err, "Failed to mark job started");
        }

        match payload {
            JobPayload::Translation(translation) => {
                self.handle_translation(job_id, translation, timeout_secs)
                    .await;
            }
            JobPayload::Cleanup(cleanup_job) => {
                cleanup::run_cleanup(&cleanup_job).await;
                if let Err(err) = self
                    .broker
                    .finish(job_id, &serde_json::Value::Null)
                    .await
                {
                    tracing::warn!(job_id = %job_id, error = %err, "Failed to finish cleanup job");
                }
            }
        }
    }

    async fn handle_translation(&self, job_id: Uuid, job: TranslationJob, timeout_secs: u64) {
        let budget = if timeout_secs > 0 {
            timeout_secs
        } else {
            self.default_timeout_secs
        };

        let outcome = tokio::time::timeout(
            Duration::from_secs(budget),
            self.pipeline.run(job_id, &job),
        )
        .await;

        match outcome {
            Ok(Ok(output)) => {
                let result = match serde_json::to_value(&output.result) {
                    Ok(result) => result,
                    Err(err) => {
                        tracing::error!(job_id = %job_id, error = %err, "Result serialization failed");
                        self.fail(job_id, &format!("Failed to serialize result: {err}"))
                            .await;
                        return;
                    }
                };

                if let Err(err) = self.broker.finish(job_id, &result).await {
                    tracing::error!(job_id = %job_id, error = %err, "Failed to store job result");
                    return;
                }
                tracing::info!(job_id = %job_id, "Translation finished");

                // Intermediate artifacts are reclaimed out of band; a failed
                // enqueue only delays that.
                let cleanup_id = Uuid::new_v4();
                if let Err(err) = self
                    .broker
                    .enqueue(
                        CLEANUP_QUEUE,
                        cleanup_id,
                        &JobPayload::Cleanup(output.cleanup),
                        self.default_timeout_secs,
                    )
                    .await
                {
                    tracing::warn!(job_id = %job_id, error = %err, "Failed to enqueue cleanup job");
                }
            }
            Ok(Err(err)) => {
                tracing::error!(job_id = %job_id, error = %err, "Translation failed");
                self.fail(job_id, &err.to_string()).await;
            }
            Err(_elapsed) => {
                tracing::error!(job_id = %job_id, budget, "Translation exceeded its budget");
                self.fail(
                    job_id,
                    &format!("Job exceeded its processing budget of {budget} seconds"),
                )
                .await;
            }
        }
    }

    async fn fail(&self, job_id: Uuid, exc_info: &str) {
        if let Err(err) = self.broker.fail(job_id, exc_info).await {
            tracing::error!(job_id = %job_id, error = %err, "Failed to record job failure");
        }
    }
}
