use super::IAppointmentRepo;
use clinic_reminders_domain::{Appointment, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresAppointmentRepo {
    pool: PgPool,
}

impl PostgresAppointmentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AppointmentRaw {
    appointment_uid: Uuid,
    tenant_uid: Uuid,
    patient_uid: Uuid,
    date: i64,
    appointment_type: String,
    status: String,
    created: i64,
    updated: i64,
}

impl TryFrom<AppointmentRaw> for Appointment {
    type Error = anyhow::Error;

    fn try_from(e: AppointmentRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: e.appointment_uid.into(),
            tenant_id: e.tenant_uid.into(),
            patient_id: e.patient_uid.into(),
            date: e.date,
            appointment_type: e.appointment_type,
            status: e.status.parse().map_err(anyhow::Error::msg)?,
            created: e.created,
            updated: e.updated,
        })
    }
}

#[async_trait::async_trait]
impl IAppointmentRepo for PostgresAppointmentRepo {
    async fn insert(&self, appointment: &Appointment) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO appointments
            (appointment_uid, tenant_uid, patient_uid, date, appointment_type, status, created, updated)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(appointment.id.inner_ref())
        .bind(appointment.tenant_id.inner_ref())
        .bind(appointment.patient_id.inner_ref())
        .bind(appointment.date)
        .bind(&appointment.appointment_type)
        .bind(appointment.status.as_str())
        .bind(appointment.created)
        .bind(appointment.updated)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to insert appointment: {:?}. DB returned error: {:?}",
                appointment, e
            );
            e
        })?;
        Ok(())
    }

    async fn save(&self, appointment: &Appointment) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE appointments
            SET date = $2,
            appointment_type = $3,
            status = $4,
            updated = $5
            WHERE appointment_uid = $1
            "#,
        )
        .bind(appointment.id.inner_ref())
        .bind(appointment.date)
        .bind(&appointment.appointment_type)
        .bind(appointment.status.as_str())
        .bind(appointment.updated)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to save appointment: {:?}. DB returned error: {:?}",
                appointment, e
            );
            e
        })?;
        Ok(())
    }

    async fn find(&self, appointment_id: &ID) -> Option<Appointment> {
        let raw = sqlx::query_as::<_, AppointmentRaw>(
            r#"
            SELECT * FROM appointments
            WHERE appointment_uid = $1
            "#,
        )
        .bind(appointment_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Find appointment with id: {:?} failed. DB returned error: {:?}",
                appointment_id, e
            );
            e
        })
        .ok()??;
        raw.try_into().ok()
    }

    async fn find_by_tenant(&self, appointment_id: &ID, tenant_id: &ID) -> Option<Appointment> {
        let raw = sqlx::query_as::<_, AppointmentRaw>(
            r#"
            SELECT * FROM appointments
            WHERE appointment_uid = $1 AND tenant_uid = $2
            "#,
        )
        .bind(appointment_id.inner_ref())
        .bind(tenant_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Find appointment with id: {:?} for tenant: {:?} failed. DB returned error: {:?}",
                appointment_id, tenant_id, e
            );
            e
        })
        .ok()??;
        raw.try_into().ok()
    }

    async fn find_many_by_tenant(
        &self,
        tenant_id: &ID,
        patient_id: Option<&ID>,
    ) -> anyhow::Result<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, AppointmentRaw>(
            r#"
            SELECT * FROM appointments
            WHERE tenant_uid = $1 AND ($2::uuid IS NULL OR patient_uid = $2)
            ORDER BY date ASC
            "#,
        )
        .bind(tenant_id.inner_ref())
        .bind(patient_id.map(|id| id.inner()))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Appointment::try_from).collect()
    }
}
