mod inmemory;
mod postgres;

pub use inmemory::InMemoryAppointmentRepo;
pub use postgres::PostgresAppointmentRepo;

use clinic_reminders_domain::{Appointment, ID};

#[async_trait::async_trait]
pub trait IAppointmentRepo: Send + Sync {
    async fn insert(&self, appointment: &Appointment) -> anyhow::Result<()>;
    async fn save(&self, appointment: &Appointment) -> anyhow::Result<()>;
    async fn find(&self, appointment_id: &ID) -> Option<Appointment>;
    /// Finds the `Appointment` only if it belongs to the given tenant
    async fn find_by_tenant(&self, appointment_id: &ID, tenant_id: &ID) -> Option<Appointment>;
    /// All the `Appointment`s of a tenant ordered by date, optionally only for one patient
    async fn find_many_by_tenant(
        &self,
        tenant_id: &ID,
        patient_id: Option<&ID>,
    ) -> anyhow::Result<Vec<Appointment>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_repos;
    use clinic_reminders_domain::Patient;

    fn patient(tenant_id: ID) -> Patient {
        Patient::new(tenant_id, "Jane".into(), "jane@example.com".into(), None)
    }

    #[actix_web::test]
    async fn filters_appointments_by_tenant() {
        for repos in create_repos().await {
            let repo = &repos.appointments;
            let tenant_id = ID::new();
            let other_tenant_id = ID::new();
            let patient_a = patient(tenant_id);
            let patient_b = patient(tenant_id);
            let foreign_patient = patient(other_tenant_id);
            for p in [&patient_a, &patient_b, &foreign_patient] {
                repos.patients.insert(p).await.unwrap();
            }

            let later = Appointment::new(tenant_id, patient_a.id, 2000, "Checkup".into(), 0);
            let earlier = Appointment::new(tenant_id, patient_b.id, 1000, "Checkup".into(), 0);
            let foreign =
                Appointment::new(other_tenant_id, foreign_patient.id, 500, "Checkup".into(), 0);
            for appointment in [&later, &earlier, &foreign] {
                repo.insert(appointment).await.unwrap();
            }

            let res = repo.find_many_by_tenant(&tenant_id, None).await.unwrap();
            assert_eq!(
                res.iter().map(|a| a.id).collect::<Vec<_>>(),
                vec![earlier.id, later.id]
            );

            let res = repo
                .find_many_by_tenant(&tenant_id, Some(&patient_a.id))
                .await
                .unwrap();
            assert_eq!(res.len(), 1);
            assert_eq!(res[0].id, later.id);

            assert!(repo.find_by_tenant(&foreign.id, &tenant_id).await.is_none());
            assert!(repo
                .find_by_tenant(&foreign.id, &other_tenant_id)
                .await
                .is_some());
        }
    }

    #[actix_web::test]
    async fn saves_changes() {
        for repos in create_repos().await {
            let tenant_id = ID::new();
            let patient = patient(tenant_id);
            repos.patients.insert(&patient).await.unwrap();

            let repo = &repos.appointments;
            let mut appointment = Appointment::new(tenant_id, patient.id, 2000, "Checkup".into(), 0);
            repo.insert(&appointment).await.unwrap();

            appointment.confirm(100);
            repo.save(&appointment).await.unwrap();
            assert_eq!(repo.find(&appointment.id).await, Some(appointment));
        }
    }
}
