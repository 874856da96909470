use super::send_reminder::{SendReminderOutcome, SendReminderUseCase};
use crate::shared::usecase::execute;
use actix_web::rt::task::JoinHandle;
use clinic_reminders_domain::{JobPayload, SEND_REMINDER_JOB};
use clinic_reminders_infra::{ClinicContext, QueuedJob};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, info_span, warn, Instrument};

/// Max number of jobs a worker loop claims per poll
const JOBS_PER_POLL: usize = 10;

/// Pool of loops that poll the queue for due reminder jobs and run them.
pub struct ReminderWorker {
    ctx: ClinicContext,
    shutdown: Option<watch::Sender<bool>>,
    loops: Vec<JoinHandle<()>>,
}

impl ReminderWorker {
    pub fn new(ctx: ClinicContext) -> Self {
        Self {
            ctx,
            shutdown: None,
            loops: Vec::new(),
        }
    }

    /// Spawns `worker_concurrency` polling loops on the current actix runtime.
    /// Does nothing if the worker is already running.
    pub fn start(&mut self) {
        if self.shutdown.is_some() {
            return;
        }
        let (shutdown, shutdown_rx) = watch::channel(false);
        for worker in 0..self.ctx.config.worker_concurrency {
            let ctx = self.ctx.clone();
            let shutdown_rx = shutdown_rx.clone();
            self.loops
                .push(actix_web::rt::spawn(poll_loop(worker, ctx, shutdown_rx)));
        }
        self.shutdown = Some(shutdown);
        info!(
            "Started reminder worker with {} loops",
            self.ctx.config.worker_concurrency
        );
    }

    /// Signals every loop to stop and waits for them to finish the job at hand
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }
        for handle in self.loops.drain(..) {
            if let Err(e) = handle.await {
                error!("Reminder worker loop ended abnormally: {:?}", e);
            }
        }
        info!("Stopped reminder worker");
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_some()
    }
}

async fn poll_loop(worker: usize, ctx: ClinicContext, mut shutdown: watch::Receiver<bool>) {
    let poll_interval = Duration::from_millis(ctx.config.worker_poll_millis);
    loop {
        if *shutdown.borrow() {
            break;
        }
        let handled = match process_due_jobs(&ctx)
            .instrument(info_span!("reminder_worker", worker))
            .await
        {
            Ok(handled) => handled,
            Err(e) => {
                error!("Failed to process reminder jobs: {:?}", e);
                0
            }
        };
        // A full batch means there is probably more waiting
        if handled < JOBS_PER_POLL {
            tokio::select! {
                changed = shutdown.changed() => {
                    // The worker was dropped without being stopped
                    if changed.is_err() {
                        break;
                    }
                }
                _ = actix_web::rt::time::sleep(poll_interval) => {}
            }
        }
    }
}

/// Claims the reminder jobs that are due and runs them one after another.
/// Returns how many jobs were handled.
pub async fn process_due_jobs(ctx: &ClinicContext) -> anyhow::Result<usize> {
    let jobs = ctx
        .queue
        .claim_due(
            SEND_REMINDER_JOB,
            ctx.sys.get_timestamp_millis(),
            JOBS_PER_POLL,
            ctx.config.stalled_timeout_millis,
        )
        .await?;

    let handled = jobs.len();
    for job in jobs {
        let span = info_span!(
            "reminder_job",
            job_id = %job.id,
            attempt = job.attempts + 1
        );
        // Leave the job as it is, it is claimed again once it counts as stalled
        if let Err(e) = handle_job(ctx, job).instrument(span).await {
            error!("Unable to record the result of a reminder job: {:?}", e);
        }
    }
    Ok(handled)
}

async fn handle_job(ctx: &ClinicContext, job: QueuedJob) -> anyhow::Result<()> {
    // Failed deliveries are dead-lettered when they run out of attempts, so an
    // exhausted job showing up here has stalled every time
    if ctx.config.retry_policy.is_exhausted(job.attempts) {
        error!("Reminder job stalled {} times, giving up", job.attempts);
        return ctx
            .queue
            .fail(&job.id, "Gave up on a job that kept stalling")
            .await;
    }

    let payload = match job.payload() {
        Ok(JobPayload::SendReminder(payload)) => payload,
        Err(e) => {
            error!("Unprocessable reminder job: {}", e);
            return ctx.queue.fail(&job.id, &e.to_string()).await;
        }
    };

    let usecase = SendReminderUseCase {
        appointment_id: payload.appointment_id,
        tenant_id: payload.tenant_id,
    };
    match execute(usecase, ctx).await {
        Ok(SendReminderOutcome::Deferred { resume_at }) => {
            ctx.queue.defer(&job.id, resume_at).await
        }
        Ok(_) => ctx.queue.complete(&job.id).await,
        Err(e) => {
            let attempts = job.attempts + 1;
            let policy = ctx.config.retry_policy;
            if policy.is_exhausted(attempts) {
                error!(
                    "Reminder job failed after {} attempts, giving up: {}",
                    attempts, e
                );
                ctx.queue.fail(&job.id, &e.to_string()).await
            } else {
                let run_at = ctx.sys.get_timestamp_millis() + policy.backoff(attempts);
                warn!(
                    "Reminder job failed on attempt {}, retrying at: {}",
                    attempts, run_at
                );
                ctx.queue.retry_at(&job.id, run_at, &e.to_string()).await
            }
        }
    }
}
