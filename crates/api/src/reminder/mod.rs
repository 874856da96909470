mod schedule_reminder;
mod send_reminder;
mod worker;

pub use schedule_reminder::{ScheduleReminderError, ScheduleReminderUseCase};
pub use send_reminder::{SendReminderError, SendReminderOutcome, SendReminderUseCase, SkipReason};
pub use worker::{process_due_jobs, ReminderWorker};
