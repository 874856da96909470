mod inmemory;
mod postgres;

pub use inmemory::InMemoryReminderRepo;
pub use postgres::PostgresReminderRepo;

use clinic_reminders_domain::{Reminder, ReminderStatus, ID};

#[async_trait::async_trait]
pub trait IReminderRepo: Send + Sync {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()>;
    /// All `Reminder`s recorded for an `Appointment`, oldest first
    async fn find_by_appointment(&self, appointment_id: &ID) -> anyhow::Result<Vec<Reminder>>;
    /// Number of `Reminder`s of a tenant with the given status
    async fn count_by_tenant(&self, tenant_id: &ID, status: ReminderStatus)
        -> anyhow::Result<usize>;
}
