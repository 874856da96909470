use crate::dtos::AppointmentDTO;
use chrono::{DateTime, Utc};
use clinic_reminders_domain::{Appointment, ID};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    pub appointment: AppointmentDTO,
}

impl AppointmentResponse {
    pub fn new(appointment: Appointment) -> Self {
        Self {
            appointment: AppointmentDTO::new(appointment),
        }
    }
}

#[derive(Deserialize)]
pub struct AppointmentPathParams {
    pub appointment_id: ID,
}

pub mod create_appointment {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub patient_id: ID,
        pub date: DateTime<Utc>,
        #[serde(rename = "type")]
        pub appointment_type: String,
    }

    pub type APIResponse = AppointmentResponse;
}

pub mod get_appointments {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct QueryParams {
        pub patient_id: Option<ID>,
    }

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub appointments: Vec<AppointmentDTO>,
    }

    impl APIResponse {
        pub fn new(appointments: Vec<Appointment>) -> Self {
            Self {
                appointments: appointments.into_iter().map(AppointmentDTO::new).collect(),
            }
        }
    }
}

pub mod confirm_appointment {
    use super::*;

    pub type PathParams = AppointmentPathParams;

    pub type APIResponse = AppointmentResponse;
}

pub mod reschedule_appointment {
    use super::*;

    pub type PathParams = AppointmentPathParams;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub date: DateTime<Utc>,
    }

    pub type APIResponse = AppointmentResponse;
}
