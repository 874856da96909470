use super::IPatientRepo;
use clinic_reminders_domain::{Patient, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresPatientRepo {
    pool: PgPool,
}

impl PostgresPatientRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PatientRaw {
    patient_uid: Uuid,
    tenant_uid: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
}

impl From<PatientRaw> for Patient {
    fn from(e: PatientRaw) -> Self {
        Self {
            id: e.patient_uid.into(),
            tenant_id: e.tenant_uid.into(),
            name: e.name,
            email: e.email,
            phone: e.phone,
        }
    }
}

#[async_trait::async_trait]
impl IPatientRepo for PostgresPatientRepo {
    async fn insert(&self, patient: &Patient) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO patients(patient_uid, tenant_uid, name, email, phone)
            VALUES($1, $2, $3, $4, $5)
            "#,
        )
        .bind(patient.id.inner_ref())
        .bind(patient.tenant_id.inner_ref())
        .bind(&patient.name)
        .bind(&patient.email)
        .bind(&patient.phone)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to insert patient: {:?}. DB returned error: {:?}",
                patient.id, e
            );
            e
        })?;
        Ok(())
    }

    async fn find(&self, patient_id: &ID) -> Option<Patient> {
        sqlx::query_as::<_, PatientRaw>(
            r#"
            SELECT * FROM patients
            WHERE patient_uid = $1
            "#,
        )
        .bind(patient_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Find patient with id: {:?} failed. DB returned error: {:?}",
                patient_id, e
            );
            e
        })
        .ok()?
        .map(|patient| patient.into())
    }

    async fn find_by_tenant(&self, patient_id: &ID, tenant_id: &ID) -> Option<Patient> {
        sqlx::query_as::<_, PatientRaw>(
            r#"
            SELECT * FROM patients
            WHERE patient_uid = $1 AND tenant_uid = $2
            "#,
        )
        .bind(patient_id.inner_ref())
        .bind(tenant_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Find patient with id: {:?} for tenant: {:?} failed. DB returned error: {:?}",
                patient_id, tenant_id, e
            );
            e
        })
        .ok()?
        .map(|patient| patient.into())
    }

    async fn find_many_by_tenant(&self, tenant_id: &ID) -> anyhow::Result<Vec<Patient>> {
        let rows = sqlx::query_as::<_, PatientRaw>(
            r#"
            SELECT * FROM patients
            WHERE tenant_uid = $1
            ORDER BY name ASC
            "#,
        )
        .bind(tenant_id.inner_ref())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Find patients for tenant: {:?} failed. DB returned error: {:?}",
                tenant_id, e
            );
            e
        })?;
        Ok(rows.into_iter().map(|patient| patient.into()).collect())
    }
}
