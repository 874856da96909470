use clinic_reminders_domain::{Patient, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PatientDTO {
    pub id: ID,
    pub tenant_id: ID,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl PatientDTO {
    pub fn new(patient: Patient) -> Self {
        Self {
            id: patient.id,
            tenant_id: patient.tenant_id,
            name: patient.name,
            email: patient.email,
            phone: patient.phone,
        }
    }
}
