use super::IAppointmentRepo;
use crate::repos::shared::inmemory_repo::*;
use clinic_reminders_domain::{Appointment, ID};

pub struct InMemoryAppointmentRepo {
    appointments: std::sync::Mutex<Vec<Appointment>>,
}

impl InMemoryAppointmentRepo {
    pub fn new() -> Self {
        Self {
            appointments: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IAppointmentRepo for InMemoryAppointmentRepo {
    async fn insert(&self, appointment: &Appointment) -> anyhow::Result<()> {
        insert(appointment, &self.appointments);
        Ok(())
    }

    async fn save(&self, appointment: &Appointment) -> anyhow::Result<()> {
        save(appointment, &self.appointments);
        Ok(())
    }

    async fn find(&self, appointment_id: &ID) -> Option<Appointment> {
        find(appointment_id, &self.appointments)
    }

    async fn find_by_tenant(&self, appointment_id: &ID, tenant_id: &ID) -> Option<Appointment> {
        find_by(&self.appointments, |a| {
            a.id == *appointment_id && a.tenant_id == *tenant_id
        })
        .into_iter()
        .next()
    }

    async fn find_many_by_tenant(
        &self,
        tenant_id: &ID,
        patient_id: Option<&ID>,
    ) -> anyhow::Result<Vec<Appointment>> {
        let mut appointments = find_by(&self.appointments, |a| {
            a.tenant_id == *tenant_id && patient_id.map(|p| a.patient_id == *p).unwrap_or(true)
        });
        appointments.sort_by_key(|a| a.date);
        Ok(appointments)
    }
}
