use clinic_reminders_domain::{ReminderChannel, ID};
use tracing::info;

/// Everything a channel needs to tell a patient about an upcoming appointment
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderMessage {
    pub appointment_id: ID,
    pub tenant_id: ID,
    pub channel: ReminderChannel,
    pub recipient: String,
    pub patient_name: String,
    pub appointment_type: String,
    pub appointment_date: i64,
}

/// Delivers reminders to patients
#[async_trait::async_trait]
pub trait INotifier: Send + Sync {
    async fn send(&self, message: &ReminderMessage) -> anyhow::Result<()>;
}

/// Notifier that only logs the reminders it is asked to deliver
pub struct LogNotifier;

#[async_trait::async_trait]
impl INotifier for LogNotifier {
    async fn send(&self, message: &ReminderMessage) -> anyhow::Result<()> {
        info!(
            "Sending {} reminder to: {} for appointment: {} at: {}",
            message.channel, message.recipient, message.appointment_id, message.appointment_date
        );
        Ok(())
    }
}
