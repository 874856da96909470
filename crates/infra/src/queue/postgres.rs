use super::{
    new_job, EnqueueOptions, EnqueueResult, IJobQueue, JobCounts, JobState, QueuedJob,
    STALLED_ERROR,
};
use clinic_reminders_domain::JobPayload;
use sqlx::{FromRow, PgPool};
use tracing::error;

/// Queue on the `reminder_jobs` table. Every queue owns the rows with its
/// name and job ids are unique within a queue. Concurrent workers never claim
/// the same row because claiming locks rows with `FOR UPDATE SKIP LOCKED`.
pub struct PostgresJobQueue {
    pool: PgPool,
    queue: String,
}

impl PostgresJobQueue {
    pub fn new(pool: PgPool, queue: &str) -> Self {
        Self {
            pool,
            queue: queue.to_string(),
        }
    }
}

#[derive(Debug, FromRow)]
struct QueuedJobRaw {
    job_id: String,
    name: String,
    payload: serde_json::Value,
    state: String,
    attempts: i32,
    run_at: i64,
    claimed_at: Option<i64>,
    last_error: Option<String>,
    created: i64,
}

impl TryFrom<QueuedJobRaw> for QueuedJob {
    type Error = anyhow::Error;

    fn try_from(e: QueuedJobRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: e.job_id,
            name: e.name,
            payload: e.payload,
            state: e.state.parse().map_err(anyhow::Error::msg)?,
            attempts: u32::try_from(e.attempts)?,
            run_at: e.run_at,
            claimed_at: e.claimed_at,
            last_error: e.last_error,
            created: e.created,
        })
    }
}

#[derive(Debug, FromRow)]
struct StateCountRaw {
    state: String,
    count: i64,
}

#[async_trait::async_trait]
impl IJobQueue for PostgresJobQueue {
    async fn add_job(
        &self,
        payload: &JobPayload,
        options: EnqueueOptions,
        now: i64,
    ) -> anyhow::Result<EnqueueResult> {
        let job = new_job(payload, options, now)?;
        let res = sqlx::query(
            r#"
            INSERT INTO reminder_jobs
            (queue, job_id, name, payload, state, attempts, run_at, created)
            VALUES($7, $1, $2, $3, $4, 0, $5, $6)
            ON CONFLICT (queue, job_id) DO NOTHING
            "#,
        )
        .bind(&job.id)
        .bind(&job.name)
        .bind(&job.payload)
        .bind(job.state.as_str())
        .bind(job.run_at)
        .bind(job.created)
        .bind(&self.queue)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Unable to add job: {:?}. DB returned error: {:?}", job, e);
            e
        })?;

        if res.rows_affected() == 1 {
            Ok(EnqueueResult::Enqueued(job.id))
        } else {
            Ok(EnqueueResult::Duplicate(job.id))
        }
    }

    async fn claim_due(
        &self,
        name: &str,
        now: i64,
        limit: usize,
        stalled_timeout: i64,
    ) -> anyhow::Result<Vec<QueuedJob>> {
        let rows = sqlx::query_as::<_, QueuedJobRaw>(
            r#"
            UPDATE reminder_jobs AS j
            SET state = 'active', claimed_at = $2,
            attempts = CASE WHEN j.state = 'active' THEN j.attempts + 1 ELSE j.attempts END,
            last_error = CASE WHEN j.state = 'active' THEN $6 ELSE j.last_error END
            WHERE j.queue = $5 AND j.job_id IN (
                SELECT job_id FROM reminder_jobs
                WHERE queue = $5 AND name = $1 AND (
                    (state IN ('waiting', 'delayed') AND run_at <= $2)
                    OR (state = 'active' AND claimed_at <= $2 - $4)
                )
                ORDER BY run_at ASC
                LIMIT $3
                FOR UPDATE SKIP LOCKED
            )
            RETURNING j.*
            "#,
        )
        .bind(name)
        .bind(now)
        .bind(i64::try_from(limit)?)
        .bind(stalled_timeout)
        .bind(&self.queue)
        .bind(STALLED_ERROR)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Unable to claim jobs: {}. DB returned error: {:?}", name, e);
            e
        })?;

        let mut jobs = rows
            .into_iter()
            .map(QueuedJob::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;
        jobs.sort_by_key(|job| job.run_at);
        Ok(jobs)
    }

    async fn complete(&self, job_id: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM reminder_jobs WHERE queue = $1 AND job_id = $2")
            .bind(&self.queue)
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn retry_at(&self, job_id: &str, run_at: i64, error: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE reminder_jobs
            SET state = 'delayed', attempts = attempts + 1, run_at = $2,
            claimed_at = NULL, last_error = $3
            WHERE queue = $4 AND job_id = $1
            "#,
        )
        .bind(job_id)
        .bind(run_at)
        .bind(error)
        .bind(&self.queue)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn defer(&self, job_id: &str, run_at: i64) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE reminder_jobs
            SET state = 'delayed', run_at = $2, claimed_at = NULL
            WHERE queue = $3 AND job_id = $1
            "#,
        )
        .bind(job_id)
        .bind(run_at)
        .bind(&self.queue)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fail(&self, job_id: &str, error: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE reminder_jobs
            SET state = 'failed', attempts = attempts + 1,
            claimed_at = NULL, last_error = $2
            WHERE queue = $3 AND job_id = $1
            "#,
        )
        .bind(job_id)
        .bind(error)
        .bind(&self.queue)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, job_id: &str) -> anyhow::Result<Option<QueuedJob>> {
        let row = sqlx::query_as::<_, QueuedJobRaw>(
            r#"
            SELECT * FROM reminder_jobs
            WHERE queue = $1 AND job_id = $2
            "#,
        )
        .bind(&self.queue)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(QueuedJob::try_from).transpose()
    }

    async fn remove(&self, job_id: &str) -> anyhow::Result<bool> {
        let res = sqlx::query(
            "DELETE FROM reminder_jobs WHERE queue = $1 AND job_id = $2 AND state <> 'active'",
        )
        .bind(&self.queue)
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn counts(&self) -> anyhow::Result<JobCounts> {
        let rows = sqlx::query_as::<_, StateCountRaw>(
            r#"
            SELECT state, COUNT(*) AS count FROM reminder_jobs
            WHERE queue = $1
            GROUP BY state
            "#,
        )
        .bind(&self.queue)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = JobCounts::default();
        for row in rows {
            let count = usize::try_from(row.count)?;
            match row.state.parse::<JobState>().map_err(anyhow::Error::msg)? {
                JobState::Waiting => counts.waiting = count,
                JobState::Delayed => counts.delayed = count,
                JobState::Active => counts.active = count,
                JobState::Failed => counts.failed = count,
            }
        }
        Ok(counts)
    }
}
