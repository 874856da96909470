mod appointment;
mod job;
mod patient;
mod quiet_hours;
mod reminder;
mod shared;

pub use appointment::{Appointment, AppointmentStatus};
pub use job::{JobPayload, JobPayloadError, SendReminderPayload, SEND_REMINDER_JOB};
pub use patient::Patient;
pub use quiet_hours::QuietHours;
pub use reminder::{
    reminder_dedupe_id, reminder_delay, reminder_lock_key, reminder_processed_key,
    reminder_time, Reminder, ReminderChannel, ReminderStatus, REMINDER_LEAD_MILLIS,
};
pub use shared::entity::{Entity, InvalidIDError, ID};
