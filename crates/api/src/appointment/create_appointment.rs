use super::subscribers::AuditAppointmentScheduled;
use crate::{
    error::ClinicError,
    reminder::{ScheduleReminderError, ScheduleReminderUseCase},
    shared::{
        tenant::ensure_tenant_header,
        usecase::{execute, Subscriber, UseCase},
    },
};
use actix_web::{web, HttpRequest, HttpResponse};
use clinic_reminders_api_structs::create_appointment::*;
use clinic_reminders_domain::{Appointment, ID};
use clinic_reminders_infra::ClinicContext;

pub async fn create_appointment_controller(
    http_req: HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<ClinicContext>,
) -> Result<HttpResponse, ClinicError> {
    let tenant_id = ensure_tenant_header(&http_req)?;
    let body = body.0;

    let usecase = CreateAppointmentUseCase {
        tenant_id,
        patient_id: body.patient_id,
        date: body.date.timestamp_millis(),
        appointment_type: body.appointment_type,
    };

    execute(usecase, &ctx)
        .await
        .map(|appointment| HttpResponse::Created().json(APIResponse::new(appointment)))
        .map_err(ClinicError::from)
}

/// Books an appointment and schedules its reminder. The request fails if the
/// reminder can not be scheduled.
#[derive(Debug)]
pub struct CreateAppointmentUseCase {
    pub tenant_id: ID,
    pub patient_id: ID,
    pub date: i64,
    pub appointment_type: String,
}

#[derive(Debug)]
pub enum UseCaseError {
    InvalidType,
    PatientNotFound(ID),
    Storage,
    ScheduleReminder(ScheduleReminderError),
}

impl From<UseCaseError> for ClinicError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InvalidType => {
                Self::BadClientData("The appointment type must not be empty".into())
            }
            UseCaseError::PatientNotFound(patient_id) => Self::NotFound(format!(
                "The patient with id: {}, was not found.",
                patient_id
            )),
            UseCaseError::Storage | UseCaseError::ScheduleReminder(_) => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for CreateAppointmentUseCase {
    type Response = Appointment;

    type Error = UseCaseError;

    const NAME: &'static str = "CreateAppointment";

    async fn execute(&mut self, ctx: &ClinicContext) -> Result<Self::Response, Self::Error> {
        if self.appointment_type.trim().is_empty() {
            return Err(UseCaseError::InvalidType);
        }

        let patient = ctx
            .repos
            .patients
            .find_by_tenant(&self.patient_id, &self.tenant_id)
            .await
            .ok_or(UseCaseError::PatientNotFound(self.patient_id))?;

        let appointment = Appointment::new(
            self.tenant_id,
            patient.id,
            self.date,
            self.appointment_type.clone(),
            ctx.sys.get_timestamp_millis(),
        );
        ctx.repos
            .appointments
            .insert(&appointment)
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
        vec![Box::new(AuditAppointmentScheduled)]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use clinic_reminders_domain::{
        reminder_dedupe_id, AppointmentStatus, JobPayload, Patient, REMINDER_LEAD_MILLIS,
    };
    use clinic_reminders_infra::{
        EnqueueOptions, EnqueueResult, IJobQueue, JobCounts, ManualSys, QueuedJob,
    };
    use std::sync::Arc;

    const NOW: i64 = 1_700_000_000_000;

    struct TestContext {
        ctx: ClinicContext,
        patient: Patient,
    }

    async fn setup() -> TestContext {
        let mut ctx = ClinicContext::create_inmemory();
        ctx.sys = Arc::new(ManualSys::new(NOW));
        let patient = Patient::new(ID::new(), "Ola".into(), "ola@example.com".into(), None);
        ctx.repos.patients.insert(&patient).await.unwrap();
        TestContext { ctx, patient }
    }

    /// Queue that is always down
    struct UnavailableQueue;

    #[async_trait::async_trait]
    impl IJobQueue for UnavailableQueue {
        async fn add_job(
            &self,
            _payload: &JobPayload,
            _options: EnqueueOptions,
            _now: i64,
        ) -> anyhow::Result<EnqueueResult> {
            Err(anyhow::Error::msg("connection refused"))
        }
        async fn claim_due(
            &self,
            _name: &str,
            _now: i64,
            _limit: usize,
            _stalled_timeout: i64,
        ) -> anyhow::Result<Vec<QueuedJob>> {
            Err(anyhow::Error::msg("connection refused"))
        }
        async fn complete(&self, _job_id: &str) -> anyhow::Result<()> {
            Err(anyhow::Error::msg("connection refused"))
        }
        async fn retry_at(&self, _job_id: &str, _run_at: i64, _error: &str) -> anyhow::Result<()> {
            Err(anyhow::Error::msg("connection refused"))
        }
        async fn defer(&self, _job_id: &str, _run_at: i64) -> anyhow::Result<()> {
            Err(anyhow::Error::msg("connection refused"))
        }
        async fn fail(&self, _job_id: &str, _error: &str) -> anyhow::Result<()> {
            Err(anyhow::Error::msg("connection refused"))
        }
        async fn find(&self, _job_id: &str) -> anyhow::Result<Option<QueuedJob>> {
            Err(anyhow::Error::msg("connection refused"))
        }
        async fn remove(&self, _job_id: &str) -> anyhow::Result<bool> {
            Err(anyhow::Error::msg("connection refused"))
        }
        async fn counts(&self) -> anyhow::Result<JobCounts> {
            Err(anyhow::Error::msg("connection refused"))
        }
    }

    #[actix_web::test]
    async fn creates_appointment_and_schedules_reminder() {
        let TestContext { ctx, patient } = setup().await;
        let date = NOW + 3 * REMINDER_LEAD_MILLIS;

        let usecase = CreateAppointmentUseCase {
            tenant_id: patient.tenant_id,
            patient_id: patient.id,
            date,
            appointment_type: "Consultation".into(),
        };
        let appointment = execute(usecase, &ctx).await.unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(appointment.created, NOW);
        assert!(ctx.repos.appointments.find(&appointment.id).await.is_some());

        let job = ctx
            .queue
            .find(&reminder_dedupe_id(&appointment.id))
            .await
            .unwrap()
            .expect("Reminder job to be queued");
        assert_eq!(job.run_at, date - REMINDER_LEAD_MILLIS);
        assert_eq!(
            job.payload().unwrap(),
            JobPayload::send_reminder(appointment.id, patient.tenant_id)
        );
    }

    #[actix_web::test]
    async fn rejects_patient_of_other_tenant() {
        let TestContext { ctx, patient } = setup().await;

        let usecase = CreateAppointmentUseCase {
            tenant_id: ID::new(),
            patient_id: patient.id,
            date: NOW,
            appointment_type: "Consultation".into(),
        };
        let res = execute(usecase, &ctx).await;
        assert!(matches!(res, Err(UseCaseError::PatientNotFound(_))));
        assert_eq!(ctx.queue.counts().await.unwrap(), JobCounts::default());
    }

    #[actix_web::test]
    async fn fails_when_reminder_can_not_be_scheduled() {
        let TestContext { mut ctx, patient } = setup().await;
        ctx.queue = Arc::new(UnavailableQueue);

        let usecase = CreateAppointmentUseCase {
            tenant_id: patient.tenant_id,
            patient_id: patient.id,
            date: NOW + 3 * REMINDER_LEAD_MILLIS,
            appointment_type: "Consultation".into(),
        };
        let res = execute(usecase, &ctx).await;
        assert!(matches!(res, Err(UseCaseError::ScheduleReminder(_))));
    }
}
