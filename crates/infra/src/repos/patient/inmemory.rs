use super::IPatientRepo;
use crate::repos::shared::inmemory_repo::*;
use clinic_reminders_domain::{Patient, ID};

pub struct InMemoryPatientRepo {
    patients: std::sync::Mutex<Vec<Patient>>,
}

impl InMemoryPatientRepo {
    pub fn new() -> Self {
        Self {
            patients: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IPatientRepo for InMemoryPatientRepo {
    async fn insert(&self, patient: &Patient) -> anyhow::Result<()> {
        insert(patient, &self.patients);
        Ok(())
    }

    async fn find(&self, patient_id: &ID) -> Option<Patient> {
        find(patient_id, &self.patients)
    }

    async fn find_by_tenant(&self, patient_id: &ID, tenant_id: &ID) -> Option<Patient> {
        self.find(patient_id)
            .await
            .filter(|patient| patient.tenant_id == *tenant_id)
    }

    async fn find_many_by_tenant(&self, tenant_id: &ID) -> anyhow::Result<Vec<Patient>> {
        let mut patients = find_by(&self.patients, |p| p.tenant_id == *tenant_id);
        patients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(patients)
    }
}
