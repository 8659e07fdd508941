//! Durable job broker backed by Redis
//!
//! Queues are Redis lists of job ids (`queue:{name}`); job records are
//! hashes (`job:{id}`). The gateway enqueues and polls, workers dequeue with
//! a blocking pop. `BRPOP` hands each id to exactly one worker, which is the
//! at-most-once dequeue guarantee the pipeline relies on.
//!
//! A single multiplexed connection is shared process-wide through
//! [`redis::aio::ConnectionManager`], which reconnects on its own after
//! broker restarts. The manager is created lazily so both binaries can start
//! while Redis is still coming up.

mod jobs;

pub use jobs::{
    CleanupJob, DequeuedJob, JobPayload, JobState, JobStatus, TranslationJob, CLEANUP_QUEUE,
    TRANSLATION_QUEUE,
};

use crate::error::{Error, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use uuid::Uuid;

fn job_key(job_id: Uuid) -> String {
    format!("job:{job_id}")
}

fn queue_key(queue: &str) -> String {
    format!("queue:{queue}")
}

/// Handle on the broker shared by the gateway and the worker.
pub struct Broker {
    client: redis::Client,
    manager: tokio::sync::OnceCell<ConnectionManager>,
    result_ttl_secs: i64,
}

impl Broker {
    /// Create a broker handle. No connection is made until first use.
    pub fn new(redis_url: &str, result_ttl_secs: i64) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            manager: tokio::sync::OnceCell::new(),
            result_ttl_secs,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        let manager = self
            .manager
            .get_or_try_init(|| ConnectionManager::new(self.client.clone()))
            .await?;
        Ok(manager.clone())
    }

    /// Round-trip a PING to verify the broker is reachable.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    /// Enqueue a job under a caller-chosen id with a processing budget.
    pub async fn enqueue(
        &self,
        queue: &str,
        job_id: Uuid,
        payload: &JobPayload,
        timeout_secs: u64,
    ) -> Result<()> {
        let encoded = serde_json::to_string(payload)?;
        let mut conn = self.connection().await?;

        let fields = [
            ("status", JobStatus::Queued.as_str().to_string()),
            ("payload", encoded),
            ("timeout_secs", timeout_secs.to_string()),
            ("enqueued_at", chrono::Utc::now().to_rfc3339()),
        ];
        let _: () = conn.hset_multiple(job_key(job_id), &fields).await?;
        let _: () = conn.lpush(queue_key(queue), job_id.to_string()).await?;

        tracing::debug!(job_id = %job_id, queue, "Job enqueued");
        Ok(())
    }

    /// Blocking-pop the next job from any of `queues`.
    ///
    /// Returns `None` when the block times out, or when the popped id no
    /// longer has a record (retention expired it while queued).
    pub async fn dequeue(&self, queues: &[&str], block_secs: f64) -> Result<Option<DequeuedJob>> {
        let keys: Vec<String> = queues.iter().map(|q| queue_key(q)).collect();
        let mut conn = self.connection().await?;

        let popped: Option<(String, String)> = conn.brpop(keys, block_secs).await?;
        let Some((popped_key, raw_id)) = popped else {
            return Ok(None);
        };

        let queue = popped_key
            .strip_prefix("queue:")
            .unwrap_or(popped_key.as_str())
            .to_string();
        let job_id = Uuid::parse_str(&raw_id)
            .map_err(|_| Error::Internal(format!("Malformed job id on queue {queue}: {raw_id}")))?;

        let record: HashMap<String, String> = conn.hgetall(job_key(job_id)).await?;
        if record.is_empty() {
            tracing::warn!(job_id = %job_id, queue, "Dequeued job has no record, skipping");
            return Ok(None);
        }

        let payload = record
            .get("payload")
            .ok_or_else(|| Error::Internal(format!("Job {job_id} has no payload")))?;
        let payload: JobPayload = serde_json::from_str(payload)?;
        let timeout_secs = record
            .get("timeout_secs")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0);

        Ok(Some(DequeuedJob {
            job_id,
            queue,
            payload,
            timeout_secs,
        }))
    }

    /// Record that a worker picked the job up.
    pub async fn mark_started(&self, job_id: Uuid) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .hset(job_key(job_id), "status", JobStatus::Started.as_str())
            .await?;
        Ok(())
    }

    /// Publish the worker's current pipeline stage for pollers.
    pub async fn set_progress_stage(&self, job_id: Uuid, stage: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.hset(job_key(job_id), "progress_stage", stage).await?;
        Ok(())
    }

    /// Store the result and move the job to `finished`.
    pub async fn finish(&self, job_id: Uuid, result: &serde_json::Value) -> Result<()> {
        let mut conn = self.connection().await?;
        let fields = [
            ("status", JobStatus::Finished.as_str().to_string()),
            ("result", result.to_string()),
        ];
        let _: () = conn.hset_multiple(job_key(job_id), &fields).await?;
        let _: () = conn.expire(job_key(job_id), self.result_ttl_secs).await?;
        Ok(())
    }

    /// Record the failure message and move the job to `failed`.
    pub async fn fail(&self, job_id: Uuid, exc_info: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let fields = [
            ("status", JobStatus::Failed.as_str().to_string()),
            ("exc_info", exc_info.to_string()),
        ];
        let _: () = conn.hset_multiple(job_key(job_id), &fields).await?;
        let _: () = conn.expire(job_key(job_id), self.result_ttl_secs).await?;
        Ok(())
    }

    /// Read a job's record for the polling endpoint.
    ///
    /// `None` means the broker has no such job (never enqueued, or expired
    /// by retention).
    pub async fn fetch_state(&self, job_id: Uuid) -> Result<Option<JobState>> {
        let mut conn = self.connection().await?;
        let record: HashMap<String, String> = conn.hgetall(job_key(job_id)).await?;
        if record.is_empty() {
            return Ok(None);
        }

        let status = record.get("status").and_then(|raw| JobStatus::parse(raw));
        let result = record
            .get("result")
            .and_then(|raw| serde_json::from_str(raw).ok());

        Ok(Some(JobState {
            status,
            progress_stage: record.get("progress_stage").cloned(),
            exc_info: record.get("exc_info").cloned(),
            result,
        }))
    }
}
