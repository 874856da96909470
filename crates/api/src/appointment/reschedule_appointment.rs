use super::subscribers::AuditAppointmentRescheduled;
use crate::{
    error::ClinicError,
    reminder::{ScheduleReminderError, ScheduleReminderUseCase},
    shared::{
        tenant::ensure_tenant_header,
        usecase::{execute, Subscriber, UseCase},
    },
};
use actix_web::{web, HttpRequest, HttpResponse};
use clinic_reminders_api_structs::reschedule_appointment::*;
use clinic_reminders_domain::{reminder_dedupe_id, reminder_processed_key, Appointment, ID};
use clinic_reminders_infra::ClinicContext;
use tracing::info;

pub async fn reschedule_appointment_controller(
    http_req: HttpRequest,
    path: web::Path<PathParams>,
    body: web::Json<RequestBody>,
    ctx: web::Data<ClinicContext>,
) -> Result<HttpResponse, ClinicError> {
    let tenant_id = ensure_tenant_header(&http_req)?;

    let usecase = RescheduleAppointmentUseCase {
        tenant_id,
        appointment_id: path.appointment_id,
        date: body.0.date.timestamp_millis(),
    };

    execute(usecase, &ctx)
        .await
        .map(|appointment| HttpResponse::Ok().json(APIResponse::new(appointment)))
        .map_err(ClinicError::from)
}

/// Moves an appointment to a new date. The patient gets a fresh reminder for
/// the new date: the pending reminder job is dropped, the processed marker of
/// an earlier reminder is cleared and the reminder is scheduled again. A job a
/// worker is running right now can not be dropped and is deferred by the worker.
#[derive(Debug)]
pub struct RescheduleAppointmentUseCase {
    pub tenant_id: ID,
    pub appointment_id: ID,
    pub date: i64,
}

#[derive(Debug)]
pub enum UseCaseError {
    NotFound(ID),
    Storage,
    ScheduleReminder(ScheduleReminderError),
}

impl From<UseCaseError> for ClinicError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(id) => Self::NotFound(format!(
                "The appointment with id: {}, was not found.",
                id
            )),
            UseCaseError::Storage | UseCaseError::ScheduleReminder(_) => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for RescheduleAppointmentUseCase {
    type Response = Appointment;

    type Error = UseCaseError;

    const NAME: &'static str = "RescheduleAppointment";

    async fn execute(&mut self, ctx: &ClinicContext) -> Result<Self::Response, Self::Error> {
        let mut appointment = ctx
            .repos
            .appointments
            .find_by_tenant(&self.appointment_id, &self.tenant_id)
            .await
            .ok_or(UseCaseError::NotFound(self.appointment_id))?;

        appointment.reschedule(self.date, ctx.sys.get_timestamp_millis());
        ctx.repos
            .appointments
            .save(&appointment)
            .await
            .map_err(|_| UseCaseError::Storage)?;

        let job_id = reminder_dedupe_id(&appointment.id);
        let removed = ctx
            .queue
            .remove(&job_id)
            .await
            .map_err(|_| UseCaseError::Storage)?;
        if !removed {
            // A running job stays in the queue and keeps the dedupe id. The
            // worker reads the new date and defers that job to the new reminder time.
            if let Ok(Some(job)) = ctx.queue.find(&job_id).await {
                info!(
                    "Reminder job: {} is {} and will be moved to the new date by the worker",
                    job.id, job.state
                );
            }
        }
        ctx.repos
            .kv
            .delete(&reminder_processed_key(&appointment.id))
            .await
            .map_err(|_| UseCaseError::Storage)?;

        let schedule_reminder = ScheduleReminderUseCase {
            appointment_id: appointment.id,
            tenant_id: appointment.tenant_id,
            date: appointment.date,
        };
        execute(schedule_reminder, ctx)
            .await
            .map_err(UseCaseError::ScheduleReminder)?;

        Ok(appointment)
    }

    fn subscribers() -> Vec<Box<dyn Subscriber<Self>>> {
        vec![Box::new(AuditAppointmentRescheduled)]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::reminder::{process_due_jobs, SendReminderOutcome, SendReminderUseCase};
    use chrono::prelude::*;
    use clinic_reminders_domain::{AppointmentStatus, Patient, REMINDER_LEAD_MILLIS, SEND_REMINDER_JOB};
    use clinic_reminders_infra::{ISys, ManualSys};
    use std::sync::Arc;

    const DAY: i64 = REMINDER_LEAD_MILLIS;

    struct TestContext {
        ctx: ClinicContext,
        sys: Arc<ManualSys>,
        appointment: Appointment,
    }

    async fn setup() -> TestContext {
        let now = Utc
            .with_ymd_and_hms(2024, 3, 4, 12, 0, 0)
            .unwrap()
            .timestamp_millis();
        let mut ctx = ClinicContext::create_inmemory();
        let sys = Arc::new(ManualSys::new(now));
        ctx.sys = sys.clone();

        let patient = Patient::new(ID::new(), "Ola".into(), "ola@example.com".into(), None);
        ctx.repos.patients.insert(&patient).await.unwrap();
        let mut appointment =
            Appointment::new(patient.tenant_id, patient.id, now + 2 * DAY, "Checkup".into(), now);
        appointment.confirm(now);
        ctx.repos.appointments.insert(&appointment).await.unwrap();
        let schedule_reminder = ScheduleReminderUseCase {
            appointment_id: appointment.id,
            tenant_id: appointment.tenant_id,
            date: appointment.date,
        };
        execute(schedule_reminder, &ctx).await.unwrap();

        TestContext {
            ctx,
            sys,
            appointment,
        }
    }

    #[actix_web::test]
    async fn replaces_pending_reminder_job() {
        let TestContext {
            ctx,
            sys,
            appointment,
        } = setup().await;
        let new_date = sys.get_timestamp_millis() + 5 * DAY;

        let usecase = RescheduleAppointmentUseCase {
            tenant_id: appointment.tenant_id,
            appointment_id: appointment.id,
            date: new_date,
        };
        let rescheduled = execute(usecase, &ctx).await.unwrap();
        assert_eq!(rescheduled.date, new_date);
        assert_eq!(rescheduled.status, AppointmentStatus::Scheduled);

        let job = ctx
            .queue
            .find(&reminder_dedupe_id(&appointment.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.run_at, new_date - DAY);
        assert_eq!(ctx.queue.counts().await.unwrap().delayed, 1);
    }

    #[actix_web::test]
    async fn starts_a_new_reminder_cycle_after_a_sent_reminder() {
        let TestContext {
            ctx,
            sys,
            appointment,
        } = setup().await;

        sys.advance(DAY);
        assert_eq!(process_due_jobs(&ctx).await.unwrap(), 1);

        let new_date = sys.get_timestamp_millis() + 3 * DAY;
        let usecase = RescheduleAppointmentUseCase {
            tenant_id: appointment.tenant_id,
            appointment_id: appointment.id,
            date: new_date,
        };
        execute(usecase, &ctx).await.unwrap();

        sys.set(new_date - DAY);
        assert_eq!(process_due_jobs(&ctx).await.unwrap(), 1);
        let reminders = ctx
            .repos
            .reminders
            .find_by_appointment(&appointment.id)
            .await
            .unwrap();
        assert_eq!(reminders.len(), 2);

        // Still only one reminder per cycle
        let usecase = SendReminderUseCase {
            appointment_id: appointment.id,
            tenant_id: appointment.tenant_id,
        };
        assert!(!matches!(
            execute(usecase, &ctx).await.unwrap(),
            SendReminderOutcome::Sent(_)
        ));
    }

    #[actix_web::test]
    async fn reminder_job_running_during_reschedule_fires_for_new_date() {
        let TestContext {
            ctx,
            sys,
            appointment,
        } = setup().await;

        // A worker has claimed the due job but not run it yet
        sys.advance(DAY);
        let claimed = ctx
            .queue
            .claim_due(
                SEND_REMINDER_JOB,
                sys.get_timestamp_millis(),
                10,
                ctx.config.stalled_timeout_millis,
            )
            .await
            .unwrap();
        assert_eq!(claimed.len(), 1);

        let new_date = sys.get_timestamp_millis() + 7 * DAY;
        let usecase = RescheduleAppointmentUseCase {
            tenant_id: appointment.tenant_id,
            appointment_id: appointment.id,
            date: new_date,
        };
        execute(usecase, &ctx).await.unwrap();

        // The worker finishes the delivery it started
        let usecase = SendReminderUseCase {
            appointment_id: appointment.id,
            tenant_id: appointment.tenant_id,
        };
        let outcome = execute(usecase, &ctx).await.unwrap();
        assert_eq!(
            outcome,
            SendReminderOutcome::Deferred {
                resume_at: new_date - DAY
            }
        );
        ctx.queue.defer(&claimed[0].id, new_date - DAY).await.unwrap();
        assert!(ctx
            .repos
            .reminders
            .find_by_appointment(&appointment.id)
            .await
            .unwrap()
            .is_empty());

        sys.set(new_date - DAY - 1);
        assert_eq!(process_due_jobs(&ctx).await.unwrap(), 0);
        sys.set(new_date - DAY);
        assert_eq!(process_due_jobs(&ctx).await.unwrap(), 1);
        let reminders = ctx
            .repos
            .reminders
            .find_by_appointment(&appointment.id)
            .await
            .unwrap();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].scheduled_at, new_date - DAY);
    }

    #[actix_web::test]
    async fn unknown_appointment_is_not_found() {
        let TestContext {
            ctx, appointment, ..
        } = setup().await;

        let usecase = RescheduleAppointmentUseCase {
            tenant_id: ID::new(),
            appointment_id: appointment.id,
            date: 0,
        };
        let res = execute(usecase, &ctx).await;
        assert!(matches!(res, Err(UseCaseError::NotFound(_))));
    }
}
