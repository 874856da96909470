use crate::{
    error::ClinicError,
    shared::{
        tenant::ensure_tenant_header,
        usecase::{execute, UseCase},
    },
};
use actix_web::{web, HttpRequest, HttpResponse};
use clinic_reminders_api_structs::get_patients::*;
use clinic_reminders_domain::{Patient, ID};
use clinic_reminders_infra::ClinicContext;

pub async fn get_patients_controller(
    http_req: HttpRequest,
    ctx: web::Data<ClinicContext>,
) -> Result<HttpResponse, ClinicError> {
    let tenant_id = ensure_tenant_header(&http_req)?;

    let usecase = GetPatientsUseCase { tenant_id };

    execute(usecase, &ctx)
        .await
        .map(|patients| HttpResponse::Ok().json(APIResponse::new(patients)))
        .map_err(ClinicError::from)
}

#[derive(Debug)]
pub struct GetPatientsUseCase {
    pub tenant_id: ID,
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
impl UseCase for GetPatientsUseCase {
    type Response = Vec<Patient>;

    type Error = UseCaseError;

    const NAME: &'static str = "GetPatients";

    async fn execute(&mut self, ctx: &ClinicContext) -> Result<Self::Response, Self::Error> {
        ctx.repos
            .patients
            .find_many_by_tenant(&self.tenant_id)
            .await
            .map_err(|_| UseCaseError::Storage)
    }
}
