use crate::shared::usecase::UseCase;
use clinic_reminders_domain::{reminder_dedupe_id, reminder_delay, JobPayload, ID};
use clinic_reminders_infra::{ClinicContext, EnqueueOptions, EnqueueResult};
use thiserror::Error;
use tracing::info;

/// Puts the reminder job for an appointment on the queue. The job is keyed by
/// the appointment, so scheduling the same appointment again while its job is
/// still queued does nothing.
#[derive(Debug)]
pub struct ScheduleReminderUseCase {
    pub appointment_id: ID,
    pub tenant_id: ID,
    /// Start of the appointment
    pub date: i64,
}

#[derive(Debug, Error)]
pub enum ScheduleReminderError {
    #[error("Unable to enqueue the reminder job: {0}")]
    Queue(anyhow::Error),
}

#[async_trait::async_trait(?Send)]
impl UseCase for ScheduleReminderUseCase {
    type Response = EnqueueResult;

    type Error = ScheduleReminderError;

    const NAME: &'static str = "ScheduleReminder";

    async fn execute(&mut self, ctx: &ClinicContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let delay = reminder_delay(self.date, now);
        let payload = JobPayload::send_reminder(self.appointment_id, self.tenant_id);
        let options = EnqueueOptions {
            delay,
            dedupe_id: Some(reminder_dedupe_id(&self.appointment_id)),
        };

        let res = ctx
            .queue
            .add_job(&payload, options, now)
            .await
            .map_err(ScheduleReminderError::Queue)?;

        match &res {
            EnqueueResult::Enqueued(job_id) => info!(
                "Scheduled reminder for appointment: {} at: {} (job: {})",
                self.appointment_id,
                now + delay,
                job_id
            ),
            EnqueueResult::Duplicate(job_id) => info!(
                "Reminder for appointment: {} is already scheduled (job: {})",
                self.appointment_id, job_id
            ),
        }
        Ok(res)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::usecase::execute;
    use clinic_reminders_domain::SEND_REMINDER_JOB;
    use clinic_reminders_infra::{JobState, ManualSys};
    use std::sync::Arc;

    const HOUR: i64 = 1000 * 60 * 60;
    const NOW: i64 = 1_700_000_000_000;

    fn setup() -> ClinicContext {
        let mut ctx = ClinicContext::create_inmemory();
        ctx.sys = Arc::new(ManualSys::new(NOW));
        ctx
    }

    #[actix_web::test]
    async fn delays_job_until_a_day_before_the_appointment() {
        let ctx = setup();
        let appointment_id = ID::new();
        let usecase = ScheduleReminderUseCase {
            appointment_id,
            tenant_id: ID::new(),
            date: NOW + 48 * HOUR,
        };

        let res = execute(usecase, &ctx).await.unwrap();
        assert_eq!(
            res,
            EnqueueResult::Enqueued(format!("reminder_{}", appointment_id))
        );

        let job = ctx.queue.find(res.job_id()).await.unwrap().unwrap();
        assert_eq!(job.name, SEND_REMINDER_JOB);
        assert_eq!(job.state, JobState::Delayed);
        assert_eq!(job.run_at, NOW + 24 * HOUR);
    }

    #[actix_web::test]
    async fn overdue_reminder_is_due_right_away() {
        let ctx = setup();
        let usecase = ScheduleReminderUseCase {
            appointment_id: ID::new(),
            tenant_id: ID::new(),
            date: NOW + 2 * HOUR,
        };

        let res = execute(usecase, &ctx).await.unwrap();
        let job = ctx.queue.find(res.job_id()).await.unwrap().unwrap();
        assert_eq!(job.state, JobState::Waiting);
        assert_eq!(job.run_at, NOW);
    }

    #[actix_web::test]
    async fn scheduling_twice_queues_one_job() {
        let ctx = setup();
        let appointment_id = ID::new();
        let tenant_id = ID::new();

        for date in [NOW + 48 * HOUR, NOW + 72 * HOUR] {
            let usecase = ScheduleReminderUseCase {
                appointment_id,
                tenant_id,
                date,
            };
            execute(usecase, &ctx).await.unwrap();
        }

        let counts = ctx.queue.counts().await.unwrap();
        assert_eq!(counts.delayed, 1);
        let job = ctx
            .queue
            .find(&reminder_dedupe_id(&appointment_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.run_at, NOW + 24 * HOUR);
    }
}
