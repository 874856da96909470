use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// How long before the start of an `Appointment` its reminder should fire
pub const REMINDER_LEAD_MILLIS: i64 = 1000 * 60 * 60 * 24;

/// Channel a `Reminder` is delivered through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderChannel {
    Email,
    Sms,
}

impl ReminderChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "EMAIL",
            Self::Sms => "SMS",
        }
    }
}

impl Display for ReminderChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EMAIL" => Ok(Self::Email),
            "SMS" => Ok(Self::Sms),
            _ => Err(format!("Unknown reminder channel: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderStatus {
    Sent,
    Failed,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "SENT",
            Self::Failed => "FAILED",
        }
    }
}

impl FromStr for ReminderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SENT" => Ok(Self::Sent),
            "FAILED" => Ok(Self::Failed),
            _ => Err(format!("Unknown reminder status: {}", s)),
        }
    }
}

/// A `Reminder` is the persisted outcome of one attempt at notifying a
/// `Patient` about an upcoming `Appointment`.
///
/// There is no uniqueness constraint on `appointment_id`. At most one `Sent`
/// reminder per appointment and cycle is guaranteed by the processed marker
/// the reminder worker sets after a successful send.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub id: ID,
    pub appointment_id: ID,
    pub tenant_id: ID,
    pub channel: ReminderChannel,
    /// When the reminder was due to be sent
    pub scheduled_at: i64,
    pub status: ReminderStatus,
    /// Only set for `Sent` reminders
    pub sent_at: Option<i64>,
}

impl Reminder {
    pub fn sent(
        appointment_id: ID,
        tenant_id: ID,
        channel: ReminderChannel,
        scheduled_at: i64,
        now: i64,
    ) -> Self {
        Self {
            id: Default::default(),
            appointment_id,
            tenant_id,
            channel,
            scheduled_at,
            status: ReminderStatus::Sent,
            sent_at: Some(now),
        }
    }

    pub fn failed(
        appointment_id: ID,
        tenant_id: ID,
        channel: ReminderChannel,
        scheduled_at: i64,
    ) -> Self {
        Self {
            id: Default::default(),
            appointment_id,
            tenant_id,
            channel,
            scheduled_at,
            status: ReminderStatus::Failed,
            sent_at: None,
        }
    }
}

impl Entity<ID> for Reminder {
    fn id(&self) -> ID {
        self.id
    }
}

/// The instant the reminder for an appointment starting at `appointment_ts` should fire
pub fn reminder_time(appointment_ts: i64) -> i64 {
    appointment_ts - REMINDER_LEAD_MILLIS
}

/// Millis from `now` until the reminder for an appointment starting at
/// `appointment_ts` should fire. Reminders that are already overdue fire
/// right away instead of being dropped.
pub fn reminder_delay(appointment_ts: i64, now: i64) -> i64 {
    std::cmp::max(0, reminder_time(appointment_ts) - now)
}

/// Queue level deduplication id of the reminder job for an appointment
pub fn reminder_dedupe_id(appointment_id: &ID) -> String {
    format!("reminder_{}", appointment_id)
}

/// Key of the lock a worker holds while processing the reminder for an appointment
pub fn reminder_lock_key(appointment_id: &ID) -> String {
    format!("lock:reminder:{}", appointment_id)
}

/// Key of the marker recording that the reminder for an appointment has been sent
pub fn reminder_processed_key(appointment_id: &ID) -> String {
    format!("processed:reminder:{}", appointment_id)
}
