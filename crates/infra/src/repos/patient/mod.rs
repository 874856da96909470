mod inmemory;
mod postgres;

pub use inmemory::InMemoryPatientRepo;
pub use postgres::PostgresPatientRepo;

use clinic_reminders_domain::{Patient, ID};

#[async_trait::async_trait]
pub trait IPatientRepo: Send + Sync {
    async fn insert(&self, patient: &Patient) -> anyhow::Result<()>;
    async fn find(&self, patient_id: &ID) -> Option<Patient>;
    /// Finds the `Patient` only if they are registered at the given tenant
    async fn find_by_tenant(&self, patient_id: &ID, tenant_id: &ID) -> Option<Patient>;
    /// All the `Patient`s of a tenant ordered by name
    async fn find_many_by_tenant(&self, tenant_id: &ID) -> anyhow::Result<Vec<Patient>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_repos;

    #[actix_web::test]
    async fn lists_patients_of_tenant_by_name() {
        for repos in create_repos().await {
            let repo = &repos.patients;
            let tenant_id = ID::new();
            let zoe = Patient::new(tenant_id, "Zoe".into(), "zoe@example.com".into(), None);
            let adam = Patient::new(
                tenant_id,
                "Adam".into(),
                "adam@example.com".into(),
                Some("+4712345678".into()),
            );
            let foreign = Patient::new(ID::new(), "Bob".into(), "bob@example.com".into(), None);
            for patient in [&zoe, &adam, &foreign] {
                repo.insert(patient).await.unwrap();
            }

            let patients = repo.find_many_by_tenant(&tenant_id).await.unwrap();
            assert_eq!(patients, vec![adam.clone(), zoe.clone()]);

            assert_eq!(
                repo.find_by_tenant(&adam.id, &tenant_id).await,
                Some(adam.clone())
            );
            assert!(repo.find_by_tenant(&foreign.id, &tenant_id).await.is_none());
            assert!(repo.find_many_by_tenant(&ID::new()).await.unwrap().is_empty());
        }
    }
}
