use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Lifecycle status of an `Appointment`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
        }
    }
}

impl Default for AppointmentStatus {
    fn default() -> Self {
        Self::Scheduled
    }
}

impl Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEDULED" => Ok(Self::Scheduled),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(format!("Unknown appointment status: {}", s)),
        }
    }
}

/// An `Appointment` is a booked visit of a `Patient` at a clinic (tenant).
/// The time at which its reminder fires is derived from `date`, it is never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    pub id: ID,
    pub tenant_id: ID,
    pub patient_id: ID,
    /// Start of the appointment as unix millis
    pub date: i64,
    /// Free text label, e.g. "Consultation" or "Follow-up"
    pub appointment_type: String,
    pub status: AppointmentStatus,
    pub created: i64,
    pub updated: i64,
}

impl Appointment {
    pub fn new(
        tenant_id: ID,
        patient_id: ID,
        date: i64,
        appointment_type: String,
        now: i64,
    ) -> Self {
        Self {
            id: Default::default(),
            tenant_id,
            patient_id,
            date,
            appointment_type,
            status: AppointmentStatus::Scheduled,
            created: now,
            updated: now,
        }
    }

    pub fn confirm(&mut self, now: i64) {
        self.status = AppointmentStatus::Confirmed;
        self.updated = now;
    }

    /// Moves the appointment to a new date, which puts it back in the `Scheduled` state
    pub fn reschedule(&mut self, date: i64, now: i64) {
        self.date = date;
        self.status = AppointmentStatus::Scheduled;
        self.updated = now;
    }

    /// Whether the patient should still be reminded about this appointment
    pub fn wants_reminder(&self) -> bool {
        matches!(
            self.status,
            AppointmentStatus::Scheduled | AppointmentStatus::Confirmed
        )
    }

    /// Still going ahead and not in the past
    pub fn is_upcoming(&self, now: i64) -> bool {
        self.wants_reminder() && self.date >= now
    }
}

impl Entity<ID> for Appointment {
    fn id(&self) -> ID {
        self.id
    }
}
