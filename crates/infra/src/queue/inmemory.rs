use super::{
    new_job, EnqueueOptions, EnqueueResult, IJobQueue, JobCounts, JobState, QueuedJob,
    STALLED_ERROR,
};
use clinic_reminders_domain::JobPayload;
use std::sync::Mutex;

pub struct InMemoryJobQueue {
    jobs: Mutex<Vec<QueuedJob>>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
        }
    }

    fn update<F: FnOnce(&mut QueuedJob)>(&self, job_id: &str, update: F) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.iter_mut().find(|job| job.id == job_id) {
            update(job);
        }
    }
}

fn is_claimable(job: &QueuedJob, name: &str, now: i64, stalled_timeout: i64) -> bool {
    if job.name != name {
        return false;
    }
    match job.state {
        JobState::Waiting | JobState::Delayed => job.run_at <= now,
        JobState::Active => job
            .claimed_at
            .map(|claimed_at| claimed_at + stalled_timeout <= now)
            .unwrap_or(true),
        JobState::Failed => false,
    }
}

#[async_trait::async_trait]
impl IJobQueue for InMemoryJobQueue {
    async fn add_job(
        &self,
        payload: &JobPayload,
        options: EnqueueOptions,
        now: i64,
    ) -> anyhow::Result<EnqueueResult> {
        let job = new_job(payload, options, now)?;
        let mut jobs = self.jobs.lock().unwrap();
        if jobs.iter().any(|existing| existing.id == job.id) {
            return Ok(EnqueueResult::Duplicate(job.id));
        }
        let id = job.id.clone();
        jobs.push(job);
        Ok(EnqueueResult::Enqueued(id))
    }

    async fn claim_due(
        &self,
        name: &str,
        now: i64,
        limit: usize,
        stalled_timeout: i64,
    ) -> anyhow::Result<Vec<QueuedJob>> {
        let mut jobs = self.jobs.lock().unwrap();
        let mut due = jobs
            .iter_mut()
            .filter(|job| is_claimable(job, name, now, stalled_timeout))
            .collect::<Vec<_>>();
        due.sort_by_key(|job| job.run_at);

        Ok(due
            .into_iter()
            .take(limit)
            .map(|job| {
                if job.state == JobState::Active {
                    job.attempts += 1;
                    job.last_error = Some(STALLED_ERROR.to_string());
                }
                job.state = JobState::Active;
                job.claimed_at = Some(now);
                job.clone()
            })
            .collect())
    }

    async fn complete(&self, job_id: &str) -> anyhow::Result<()> {
        self.jobs.lock().unwrap().retain(|job| job.id != job_id);
        Ok(())
    }

    async fn retry_at(&self, job_id: &str, run_at: i64, error: &str) -> anyhow::Result<()> {
        self.update(job_id, |job| {
            job.state = JobState::Delayed;
            job.attempts += 1;
            job.run_at = run_at;
            job.claimed_at = None;
            job.last_error = Some(error.to_string());
        });
        Ok(())
    }

    async fn defer(&self, job_id: &str, run_at: i64) -> anyhow::Result<()> {
        self.update(job_id, |job| {
            job.state = JobState::Delayed;
            job.run_at = run_at;
            job.claimed_at = None;
        });
        Ok(())
    }

    async fn fail(&self, job_id: &str, error: &str) -> anyhow::Result<()> {
        self.update(job_id, |job| {
            job.state = JobState::Failed;
            job.attempts += 1;
            job.claimed_at = None;
            job.last_error = Some(error.to_string());
        });
        Ok(())
    }

    async fn find(&self, job_id: &str) -> anyhow::Result<Option<QueuedJob>> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs.iter().find(|job| job.id == job_id).cloned())
    }

    async fn remove(&self, job_id: &str) -> anyhow::Result<bool> {
        let mut jobs = self.jobs.lock().unwrap();
        let index = jobs
            .iter()
            .position(|job| job.id == job_id && job.state != JobState::Active);
        match index {
            Some(index) => {
                jobs.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn counts(&self) -> anyhow::Result<JobCounts> {
        let jobs = self.jobs.lock().unwrap();
        let mut counts = JobCounts::default();
        for job in jobs.iter() {
            match job.state {
                JobState::Waiting => counts.waiting += 1,
                JobState::Delayed => counts.delayed += 1,
                JobState::Active => counts.active += 1,
                JobState::Failed => counts.failed += 1,
            }
        }
        Ok(counts)
    }
}
