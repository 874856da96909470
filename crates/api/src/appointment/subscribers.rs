use super::{
    confirm_appointment::ConfirmAppointmentUseCase, create_appointment::CreateAppointmentUseCase,
    reschedule_appointment::RescheduleAppointmentUseCase,
};
use crate::shared::usecase::Subscriber;
use clinic_reminders_domain::Appointment;
use clinic_reminders_infra::ClinicContext;
use tracing::info;

fn audit(action: &str, appointment: &Appointment) {
    info!(
        target: "audit",
        action,
        tenant_id = %appointment.tenant_id,
        appointment_id = %appointment.id,
        date = appointment.date,
        appointment_type = %appointment.appointment_type,
        "{} on appointment {}",
        action,
        appointment.id
    );
}

pub struct AuditAppointmentScheduled;

#[async_trait::async_trait(?Send)]
impl Subscriber<CreateAppointmentUseCase> for AuditAppointmentScheduled {
    async fn notify(&self, e: &Appointment, _ctx: &ClinicContext) {
        audit("SCHEDULE_APPT", e);
    }
}

pub struct AuditAppointmentConfirmed;

#[async_trait::async_trait(?Send)]
impl Subscriber<ConfirmAppointmentUseCase> for AuditAppointmentConfirmed {
    async fn notify(&self, e: &Appointment, _ctx: &ClinicContext) {
        audit("CONFIRM_APPT", e);
    }
}

pub struct AuditAppointmentRescheduled;

#[async_trait::async_trait(?Send)]
impl Subscriber<RescheduleAppointmentUseCase> for AuditAppointmentRescheduled {
    async fn notify(&self, e: &Appointment, _ctx: &ClinicContext) {
        audit("RESCHEDULE_APPT", e);
    }
}
