use crate::error::ClinicError;
use actix_web::HttpRequest;
use clinic_reminders_api_structs::TENANT_HEADER;
use clinic_reminders_domain::ID;

/// The tenant a request is made on behalf of, taken from the `x-tenant-id` header
pub fn ensure_tenant_header(req: &HttpRequest) -> Result<ID, ClinicError> {
    match req.headers().get(TENANT_HEADER) {
        Some(tenant_id) => match tenant_id.to_str().map(|t| t.parse::<ID>()) {
            Ok(Ok(tenant_id)) => Ok(tenant_id),
            _ => Err(ClinicError::UnidentifiableClient(format!(
                "Malformed tenant header provided: {:?}",
                tenant_id
            ))),
        },
        None => Err(ClinicError::UnidentifiableClient(
            "Unable to find tenant header".into(),
        )),
    }
}
