use super::IReminderRepo;
use clinic_reminders_domain::{Reminder, ReminderStatus, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresReminderRepo {
    pool: PgPool,
}

impl PostgresReminderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReminderRaw {
    reminder_uid: Uuid,
    appointment_uid: Uuid,
    tenant_uid: Uuid,
    channel: String,
    scheduled_at: i64,
    status: String,
    sent_at: Option<i64>,
}

impl TryFrom<ReminderRaw> for Reminder {
    type Error = anyhow::Error;

    fn try_from(e: ReminderRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: e.reminder_uid.into(),
            appointment_id: e.appointment_uid.into(),
            tenant_id: e.tenant_uid.into(),
            channel: e.channel.parse().map_err(anyhow::Error::msg)?,
            scheduled_at: e.scheduled_at,
            status: e.status.parse().map_err(anyhow::Error::msg)?,
            sent_at: e.sent_at,
        })
    }
}

#[async_trait::async_trait]
impl IReminderRepo for PostgresReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reminders
            (reminder_uid, appointment_uid, tenant_uid, channel, scheduled_at, status, sent_at)
            VALUES($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(reminder.id.inner_ref())
        .bind(reminder.appointment_id.inner_ref())
        .bind(reminder.tenant_id.inner_ref())
        .bind(reminder.channel.as_str())
        .bind(reminder.scheduled_at)
        .bind(reminder.status.as_str())
        .bind(reminder.sent_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to insert reminder: {:?}. DB returned error: {:?}",
                reminder, e
            );
            e
        })?;
        Ok(())
    }

    async fn find_by_appointment(&self, appointment_id: &ID) -> anyhow::Result<Vec<Reminder>> {
        let rows = sqlx::query_as::<_, ReminderRaw>(
            r#"
            SELECT * FROM reminders
            WHERE appointment_uid = $1
            ORDER BY scheduled_at ASC, sent_at ASC NULLS FIRST
            "#,
        )
        .bind(appointment_id.inner_ref())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Reminder::try_from).collect()
    }

    async fn count_by_tenant(
        &self,
        tenant_id: &ID,
        status: ReminderStatus,
    ) -> anyhow::Result<usize> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM reminders
            WHERE tenant_uid = $1 AND status = $2
            "#,
        )
        .bind(tenant_id.inner_ref())
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(usize::try_from(count)?)
    }
}
