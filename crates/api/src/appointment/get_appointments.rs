use crate::{
    error::ClinicError,
    shared::{
        tenant::ensure_tenant_header,
        usecase::{execute, UseCase},
    },
};
use actix_web::{web, HttpRequest, HttpResponse};
use clinic_reminders_api_structs::get_appointments::*;
use clinic_reminders_domain::{Appointment, ID};
use clinic_reminders_infra::ClinicContext;

pub async fn get_appointments_controller(
    http_req: HttpRequest,
    query: web::Query<QueryParams>,
    ctx: web::Data<ClinicContext>,
) -> Result<HttpResponse, ClinicError> {
    let tenant_id = ensure_tenant_header(&http_req)?;

    let usecase = GetAppointmentsUseCase {
        tenant_id,
        patient_id: query.0.patient_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|appointments| HttpResponse::Ok().json(APIResponse::new(appointments)))
        .map_err(ClinicError::from)
}

#[derive(Debug)]
pub struct GetAppointmentsUseCase {
    pub tenant_id: ID,
    pub patient_id: Option<ID>,
}

#[derive(Debug)]
pub enum UseCaseError {
    Storage,
}

impl From<UseCaseError> for ClinicError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::Storage => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetAppointmentsUseCase {
    type Response = Vec<Appointment>;

    type Error = UseCaseError;

    const NAME: &'static str = "GetAppointments";

    async fn execute(&mut self, ctx: &ClinicContext) -> Result<Self::Response, Self::Error> {
        ctx.repos
            .appointments
            .find_many_by_tenant(&self.tenant_id, self.patient_id.as_ref())
            .await
            .map_err(|_| UseCaseError::Storage)
    }
}
