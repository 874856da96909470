mod inmemory;
mod postgres;

pub use inmemory::InMemoryJobQueue;
pub use postgres::PostgresJobQueue;

use clinic_reminders_domain::{JobPayload, JobPayloadError};
use std::{fmt::Display, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Due and ready to be claimed by a worker
    Waiting,
    /// Not eligible for delivery before `run_at`
    Delayed,
    /// Claimed by a worker
    Active,
    /// Out of attempts or unprocessable. Stays in the queue until removed.
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Delayed => "delayed",
            Self::Active => "active",
            Self::Failed => "failed",
        }
    }
}

impl Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "delayed" => Ok(Self::Delayed),
            "active" => Ok(Self::Active),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown job state: {}", s)),
        }
    }
}

/// A job as it is stored in the queue. The payload is kept as json and only
/// turned into a `JobPayload` when a worker asks for it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedJob {
    /// The dedupe id if one was given when the job was added
    pub id: String,
    pub name: String,
    pub payload: serde_json::Value,
    pub state: JobState,
    /// Number of failed or stalled deliveries so far
    pub attempts: u32,
    pub run_at: i64,
    pub claimed_at: Option<i64>,
    pub last_error: Option<String>,
    pub created: i64,
}

impl QueuedJob {
    pub fn payload(&self) -> Result<JobPayload, JobPayloadError> {
        JobPayload::decode(&self.name, &self.payload)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnqueueOptions {
    /// Millis from now until the job can be delivered
    pub delay: i64,
    /// Adding a job with an id that is already in the queue is a no-op
    pub dedupe_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnqueueResult {
    Enqueued(String),
    /// A job with this id was already in the queue and it was left untouched
    Duplicate(String),
}

impl EnqueueResult {
    pub fn job_id(&self) -> &str {
        match self {
            Self::Enqueued(id) | Self::Duplicate(id) => id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobCounts {
    pub waiting: usize,
    pub delayed: usize,
    pub active: usize,
    pub failed: usize,
}

/// How often and how far apart a failing job is redelivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Deliveries before the job is moved to `Failed`
    pub max_attempts: u32,
    pub backoff_millis: i64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_millis: 1000,
        }
    }
}

impl RetryPolicy {
    /// Delay before the next delivery after `attempt` (1-indexed) failed deliveries
    pub fn backoff(&self, attempt: u32) -> i64 {
        if attempt == 0 {
            return 0;
        }
        let factor = 2i64.checked_pow(attempt - 1).unwrap_or(i64::MAX);
        self.backoff_millis.saturating_mul(factor)
    }

    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}

/// Durable queue of named jobs with delayed delivery and deduplication by job id.
///
/// Operations that take a job id and do not find the job are no-ops, since a
/// job can be removed while a worker holds it.
#[async_trait::async_trait]
pub trait IJobQueue: Send + Sync {
    async fn add_job(
        &self,
        payload: &JobPayload,
        options: EnqueueOptions,
        now: i64,
    ) -> anyhow::Result<EnqueueResult>;
    /// Moves up to `limit` due jobs with the given name to `Active` and returns them.
    /// Active jobs claimed at or before `now - stalled_timeout` are claimed again,
    /// which counts as a failed delivery.
    async fn claim_due(
        &self,
        name: &str,
        now: i64,
        limit: usize,
        stalled_timeout: i64,
    ) -> anyhow::Result<Vec<QueuedJob>>;
    /// Removes a job that was handled
    async fn complete(&self, job_id: &str) -> anyhow::Result<()>;
    /// Records a failed delivery and delays the job until `run_at`
    async fn retry_at(&self, job_id: &str, run_at: i64, error: &str) -> anyhow::Result<()>;
    /// Delays the job until `run_at` without consuming an attempt
    async fn defer(&self, job_id: &str, run_at: i64) -> anyhow::Result<()>;
    /// Records a failed delivery and moves the job to `Failed`
    async fn fail(&self, job_id: &str, error: &str) -> anyhow::Result<()>;
    async fn find(&self, job_id: &str) -> anyhow::Result<Option<QueuedJob>>;
    /// Removes a job that is not currently `Active`. Returns `true` if a job was removed.
    async fn remove(&self, job_id: &str) -> anyhow::Result<bool>;
    async fn counts(&self) -> anyhow::Result<JobCounts>;
}

/// `last_error` of a job that was claimed again after it stalled
const STALLED_ERROR: &str = "Job stalled, the worker did not finish it in time";

fn new_job(
    payload: &JobPayload,
    options: EnqueueOptions,
    now: i64,
) -> Result<QueuedJob, JobPayloadError> {
    let body = payload.encode()?;
    let delay = std::cmp::max(0, options.delay);
    Ok(QueuedJob {
        id: options
            .dedupe_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        name: payload.name().to_string(),
        payload: body,
        state: if delay > 0 {
            JobState::Delayed
        } else {
            JobState::Waiting
        },
        attempts: 0,
        run_at: now + delay,
        claimed_at: None,
        last_error: None,
        created: now,
    })
}
