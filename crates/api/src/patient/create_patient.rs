use crate::{
    error::ClinicError,
    shared::{
        tenant::ensure_tenant_header,
        usecase::{execute, UseCase},
    },
};
use actix_web::{web, HttpRequest, HttpResponse};
use clinic_reminders_api_structs::create_patient::*;
use clinic_reminders_domain::{Patient, ID};
use clinic_reminders_infra::ClinicContext;

pub async fn create_patient_controller(
    http_req: HttpRequest,
    body: web::Json<RequestBody>,
    ctx: web::Data<ClinicContext>,
) -> Result<HttpResponse, ClinicError> {
    let tenant_id = ensure_tenant_header(&http_req)?;
    let body = body.0;

    let usecase = CreatePatientUseCase {
        tenant_id,
        name: body.name,
        email: body.email,
        phone: body.phone,
    };

    execute(usecase, &ctx)
        .await
        .map(|patient| HttpResponse::Created().json(APIResponse::new(patient)))
        .map_err(ClinicError::from)
}

#[derive(Debug)]
pub struct CreatePatientUseCase {
    pub tenant_id: ID,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug)]
pub enum UseCaseError {
    InvalidName,
    InvalidEmail(String),
    Storage,
}

impl From<UseCaseError> for ClinicError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InvalidName => {
                Self::BadClientData("The patient name must not be empty".into())
            }
            UseCaseError::InvalidEmail(email) => {
                Self::BadClientData(format!("Invalid email address: {}", email))
            }
            UseCaseError::Storage => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for CreatePatientUseCase {
    type Response = Patient;

    type Error = UseCaseError;

    const NAME: &'static str = "CreatePatient";

    async fn execute(&mut self, ctx: &ClinicContext) -> Result<Self::Response, Self::Error> {
        if self.name.trim().is_empty() {
            return Err(UseCaseError::InvalidName);
        }
        // Reminders go out by email, so there has to be something to send to
        if !self.email.contains('@') {
            return Err(UseCaseError::InvalidEmail(self.email.clone()));
        }

        let patient = Patient::new(
            self.tenant_id,
            self.name.trim().to_string(),
            self.email.trim().to_string(),
            self.phone.clone(),
        );
        ctx.repos
            .patients
            .insert(&patient)
            .await
            .map_err(|_| UseCaseError::Storage)?;

        Ok(patient)
    }
}
