use crate::dtos::PatientDTO;
use clinic_reminders_domain::Patient;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientResponse {
    pub patient: PatientDTO,
}

impl PatientResponse {
    pub fn new(patient: Patient) -> Self {
        Self {
            patient: PatientDTO::new(patient),
        }
    }
}

pub mod create_patient {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub name: String,
        pub email: String,
        #[serde(default)]
        pub phone: Option<String>,
    }

    pub type APIResponse = PatientResponse;
}

pub mod get_patients {
    use super::*;

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub patients: Vec<PatientDTO>,
    }

    impl APIResponse {
        pub fn new(patients: Vec<Patient>) -> Self {
            Self {
                patients: patients.into_iter().map(PatientDTO::new).collect(),
            }
        }
    }
}
