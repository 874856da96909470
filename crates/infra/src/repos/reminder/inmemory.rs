use super::IReminderRepo;
use crate::repos::shared::inmemory_repo::*;
use clinic_reminders_domain::{Reminder, ReminderStatus, ID};

pub struct InMemoryReminderRepo {
    reminders: std::sync::Mutex<Vec<Reminder>>,
}

impl InMemoryReminderRepo {
    pub fn new() -> Self {
        Self {
            reminders: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IReminderRepo for InMemoryReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        insert(reminder, &self.reminders);
        Ok(())
    }

    async fn find_by_appointment(&self, appointment_id: &ID) -> anyhow::Result<Vec<Reminder>> {
        Ok(find_by(&self.reminders, |r| r.appointment_id == *appointment_id))
    }

    async fn count_by_tenant(
        &self,
        tenant_id: &ID,
        status: ReminderStatus,
    ) -> anyhow::Result<usize> {
        Ok(find_by(&self.reminders, |r| r.tenant_id == *tenant_id && r.status == status).len())
    }
}
