use super::subscribers::AuditAppointmentConfirmed;
use crate::{
    error::ClinicError,
    shared::{
        tenant::ensure_tenant_header,
        usecase::{execute, Subscriber, UseCase},
    },
};
use actix_web::{web, HttpRequest, HttpResponse};
use clinic_reminders_api_structs::confirm_appointment::*;
use clinic_reminders_domain::{Appointment, ID};
use clinic_reminders_infra::ClinicContext;

pub async fn confirm_appointment_controller(
    http_req: HttpRequest,
    path: web::Path<PathParams>,
    ctx: web::Data<ClinicContext>,
) -> Result<HttpResponse, ClinicError> {
    let tenant_id = ensure_tenant_header(&http_req)?;

    let usecase = ConfirmAppointmentUseCase {
        tenant_id,
        appointment_id: path.appointment_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|appointment| HttpResponse::Ok().json(APIResponse::new(appointment)))
        .map_err(ClinicError::from)
}

/// Confirming does not touch the reminder, a confirmed appointment is still reminded about
#[derive(Debug)]
pub struct ConfirmAppointmentUseCase {
    pub tenant_id: ID,
    pub appointment_id: ID,
}

#[derive(Debug)]
pub enum UseCaseError {
    NotFound(ID),
    Storage,
}

impl From<UseCaseError> for ClinicError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound(id) => Self::NotFound(format!(
                "The appointment with id: {}, was not found.",
                id
            )),
            UseCaseError::Storage => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for ConfirmAppointmentUseCase {
    type Response = Appointment;

    type Error = UseCaseError;

    const NAME: &'static str = "ConfirmAppointment";

    async fn execute(&mut self, ctx: &ClinicContext) -> Result<Self::Response, Self::Error> {
        let mut appointment = ctx
            .repos
            .appointments
            .find_by_tenant(&self.appointment_id, &self.tenant_id)
            .await
            .ok_or(UseCaseError::NotFound(self.appointment_id))?;

        appointment.confirm(ctx.sys.get_timestamp_millis());
        ctx.repos
            .appointments
            .save(&appointment)
            .await
            .map_err(|_| UseCaseError::Storage)?;

        Ok(appointment)
    }

    fn subscribers() -> Vec<Box<dyn Subscriber<Self>>> {
        vec![Box::new(AuditAppointmentConfirmed)]
    }
}
