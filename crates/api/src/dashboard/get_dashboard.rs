use crate::{
    error::ClinicError,
    shared::{
        tenant::ensure_tenant_header,
        usecase::{execute, UseCase},
    },
};
use actix_web::{web, HttpRequest, HttpResponse};
use clinic_reminders_api_structs::get_dashboard::*;
use clinic_reminders_domain::{ReminderStatus, ID};
use clinic_reminders_infra::ClinicContext;
use tracing::error;

pub async fn get_dashboard_controller(
    http_req: HttpRequest,
    ctx: web::Data<ClinicContext>,
) -> Result<HttpResponse, ClinicError> {
    let tenant_id = ensure_tenant_header(&http_req)?;

    let usecase = GetDashboardUseCase { tenant_id };

    execute(usecase, &ctx)
        .await
        .map(|stats| HttpResponse::Ok().json(APIResponse { stats }))
        .map_err(ClinicError::from)
}

#[derive(Debug)]
pub struct GetDashboardUseCase {
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

fn storage_error(e: anyhow::Error) -> UseCaseError {
    error!("Unable to collect dashboard stats: {:?}", e);
    UseCaseError::Storage
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetDashboardUseCase {
    type Response = DashboardStatsDTO;

    type Error = UseCaseError;

    const NAME: &'static str = "GetDashboard";

    async fn execute(&mut self, ctx: &ClinicContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let total_patients = ctx
            .repos
            .patients
            .find_many_by_tenant(&self.tenant_id)
            .await
            .map_err(storage_error)?
            .len();
        let upcoming_appointments = ctx
            .repos
            .appointments
            .find_many_by_tenant(&self.tenant_id, None)
            .await
            .map_err(storage_error)?
            .iter()
            .filter(|appointment| appointment.is_upcoming(now))
            .count();
        let failed_reminders = ctx
            .repos
            .reminders
            .count_by_tenant(&self.tenant_id, ReminderStatus::Failed)
            .await
            .map_err(storage_error)?;

        Ok(DashboardStatsDTO {
            total_patients,
            upcoming_appointments,
            failed_reminders,
        })
    }
}
