mod appointment;
mod dashboard;
mod patient;
mod status;

pub mod dtos {
    pub use crate::appointment::dtos::*;
    pub use crate::patient::dtos::*;
}

pub use crate::appointment::api::*;
pub use crate::dashboard::api::*;
pub use crate::patient::api::*;
pub use crate::status::api::*;

/// Header that names the tenant (clinic) a request is made on behalf of
pub const TENANT_HEADER: &str = "x-tenant-id";
