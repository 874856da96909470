use crate::shared::usecase::UseCase;
use clinic_reminders_domain::{
    reminder_lock_key, reminder_processed_key, reminder_time, Reminder, ReminderChannel, ID,
};
use clinic_reminders_infra::{
    acquire_lock, is_processed, mark_processed, release_lock, ClinicContext, ReminderMessage,
    ReminderMetricStatus,
};
use thiserror::Error;
use tracing::{info, warn};

/// Delivers the reminder for a single appointment. This is what runs for every
/// delivery attempt of a reminder job, so it has to be safe to run any number
/// of times and concurrently for the same appointment:
///
/// 1. The lock for the appointment is taken, if someone else holds it the attempt is skipped
/// 2. During quiet hours nothing is sent and the attempt is deferred to the end of the window
/// 3. If the reminder is marked as processed nothing is sent
/// 4. If the appointment was moved and its reminder is not due yet, the attempt
///    is deferred to the new reminder time
/// 5. The patient is notified and a `Sent` reminder is stored
/// 6. The reminder is marked as processed
///
/// The lock is released on every path after it was taken. Every attempt that
/// gets past the quiet hours and ends in a send or an error is counted in the
/// `reminders_sent_total` metric.
#[derive(Debug)]
pub struct SendReminderUseCase {
    pub appointment_id: ID,
    pub tenant_id: ID,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another attempt for the same appointment is in progress
    Locked,
    AlreadyProcessed,
    /// The appointment or its patient is gone, or the appointment was cancelled or completed
    AppointmentUnavailable,
}

#[derive(Debug, PartialEq)]
pub enum SendReminderOutcome {
    Sent(Reminder),
    Skipped(SkipReason),
    /// Held back by quiet hours or because the appointment was moved, nothing was recorded
    Deferred { resume_at: i64 },
}

#[derive(Debug, Error)]
pub enum SendReminderError {
    #[error("Lock store failed: {0}")]
    LockStore(anyhow::Error),
    #[error("Notifier failed to deliver the reminder: {0}")]
    Notify(anyhow::Error),
    #[error("Unable to store the reminder: {0}")]
    Storage(anyhow::Error),
    #[error("Unable to mark the reminder as processed: {0}")]
    MarkProcessed(anyhow::Error),
}

const CHANNEL: ReminderChannel = ReminderChannel::Email;

impl SendReminderUseCase {
    async fn send_locked(
        &self,
        ctx: &ClinicContext,
    ) -> Result<SendReminderOutcome, SendReminderError> {
        let now = ctx.sys.get_timestamp_millis();
        let quiet_hours = &ctx.config.quiet_hours;
        if quiet_hours.contains(now) {
            let resume_at = quiet_hours.next_allowed(now);
            info!(
                "Holding back reminder for appointment: {} during quiet hours until: {}",
                self.appointment_id, resume_at
            );
            return Ok(SendReminderOutcome::Deferred { resume_at });
        }

        let processed_key = reminder_processed_key(&self.appointment_id);
        if is_processed(ctx.repos.kv.as_ref(), &processed_key, now)
            .await
            .map_err(SendReminderError::LockStore)?
        {
            info!(
                "Reminder already processed for appointment: {}",
                self.appointment_id
            );
            return Ok(SendReminderOutcome::Skipped(SkipReason::AlreadyProcessed));
        }

        let appointment = match ctx
            .repos
            .appointments
            .find_by_tenant(&self.appointment_id, &self.tenant_id)
            .await
        {
            Some(appointment) if appointment.wants_reminder() => appointment,
            _ => {
                info!(
                    "Appointment: {} no longer wants a reminder",
                    self.appointment_id
                );
                return Ok(SendReminderOutcome::Skipped(
                    SkipReason::AppointmentUnavailable,
                ));
            }
        };
        // A job that was already running when the appointment was rescheduled
        let scheduled_at = reminder_time(appointment.date);
        if scheduled_at > now {
            info!(
                "Reminder for appointment: {} is not due before: {}",
                self.appointment_id, scheduled_at
            );
            return Ok(SendReminderOutcome::Deferred {
                resume_at: scheduled_at,
            });
        }

        let patient = match ctx
            .repos
            .patients
            .find_by_tenant(&appointment.patient_id, &self.tenant_id)
            .await
        {
            Some(patient) => patient,
            None => {
                info!(
                    "Patient: {} of appointment: {} was not found",
                    appointment.patient_id, self.appointment_id
                );
                return Ok(SendReminderOutcome::Skipped(
                    SkipReason::AppointmentUnavailable,
                ));
            }
        };

        let message = ReminderMessage {
            appointment_id: appointment.id,
            tenant_id: self.tenant_id,
            channel: CHANNEL,
            recipient: patient.email,
            patient_name: patient.name,
            appointment_type: appointment.appointment_type,
            appointment_date: appointment.date,
        };
        if let Err(e) = ctx.notifier.send(&message).await {
            let failed = Reminder::failed(appointment.id, self.tenant_id, CHANNEL, scheduled_at);
            if let Err(e) = ctx.repos.reminders.insert(&failed).await {
                warn!(
                    "Unable to record failed reminder for appointment: {}. Error: {:?}",
                    self.appointment_id, e
                );
            }
            return Err(SendReminderError::Notify(e));
        }

        let reminder = Reminder::sent(
            appointment.id,
            self.tenant_id,
            CHANNEL,
            scheduled_at,
            ctx.sys.get_timestamp_millis(),
        );
        ctx.repos
            .reminders
            .insert(&reminder)
            .await
            .map_err(SendReminderError::Storage)?;

        // Failing here leaves a sent reminder without a marker, so the next
        // delivery of the job sends it again
        mark_processed(
            ctx.repos.kv.as_ref(),
            &processed_key,
            ctx.config.processed_ttl_millis,
            ctx.sys.get_timestamp_millis(),
        )
        .await
        .map_err(SendReminderError::MarkProcessed)?;

        info!("Reminder sent for appointment: {}", self.appointment_id);
        Ok(SendReminderOutcome::Sent(reminder))
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for SendReminderUseCase {
    type Response = SendReminderOutcome;

    type Error = SendReminderError;

    const NAME: &'static str = "SendReminder";

    async fn execute(&mut self, ctx: &ClinicContext) -> Result<Self::Response, Self::Error> {
        let kv = ctx.repos.kv.as_ref();
        let lock_key = reminder_lock_key(&self.appointment_id);
        let lock = acquire_lock(
            kv,
            &lock_key,
            ctx.config.lock_ttl_millis,
            ctx.sys.get_timestamp_millis(),
        )
        .await
        .map_err(SendReminderError::LockStore)?;
        let lock = match lock {
            Some(lock) => lock,
            None => {
                info!(
                    "Skipping locked reminder for appointment: {}",
                    self.appointment_id
                );
                return Ok(SendReminderOutcome::Skipped(SkipReason::Locked));
            }
        };

        let res = self.send_locked(ctx).await;

        if let Err(e) = release_lock(kv, lock).await {
            warn!("Unable to release lock: {}. Error: {:?}", lock_key, e);
        }

        match &res {
            Ok(SendReminderOutcome::Sent(_)) => ctx.metrics.inc_reminders_sent(
                CHANNEL,
                &self.tenant_id,
                ReminderMetricStatus::Success,
            ),
            Err(_) => ctx.metrics.inc_reminders_sent(
                CHANNEL,
                &self.tenant_id,
                ReminderMetricStatus::Error,
            ),
            Ok(_) => (),
        }

        res
    }
}
