use crate::shared::entity::ID;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the job that sends the reminder for a single appointment
pub const SEND_REMINDER_JOB: &str = "send-reminder";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReminderPayload {
    pub appointment_id: ID,
    pub tenant_id: ID,
}

/// Every job the reminder queue knows how to run, keyed by job name.
///
/// Queue backends store the payload as json next to the job name and
/// go through `JobPayload::decode` when handing a job to a worker, so a
/// payload is validated both when it is enqueued and when it is dequeued.
#[derive(Debug, Clone, PartialEq)]
pub enum JobPayload {
    SendReminder(SendReminderPayload),
}

#[derive(Debug, Error)]
pub enum JobPayloadError {
    #[error("Unknown job name: `{0}`")]
    UnknownJob(String),
    #[error("Malformed payload for job `{name}`: {reason}")]
    Malformed { name: String, reason: String },
    #[error("Invalid payload for job `{name}`: {reason}")]
    Invalid { name: String, reason: String },
}

impl JobPayload {
    pub fn send_reminder(appointment_id: ID, tenant_id: ID) -> Self {
        Self::SendReminder(SendReminderPayload {
            appointment_id,
            tenant_id,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SendReminder(_) => SEND_REMINDER_JOB,
        }
    }

    pub fn validate(&self) -> Result<(), JobPayloadError> {
        match self {
            Self::SendReminder(payload) => {
                if payload.appointment_id.is_nil() {
                    return Err(self.invalid("appointmentId must be set"));
                }
                if payload.tenant_id.is_nil() {
                    return Err(self.invalid("tenantId must be set"));
                }
                Ok(())
            }
        }
    }

    /// Serializes the payload body, without the job name, after validating it
    pub fn encode(&self) -> Result<serde_json::Value, JobPayloadError> {
        self.validate()?;
        let body = match self {
            Self::SendReminder(payload) => serde_json::to_value(payload),
        };
        body.map_err(|e| JobPayloadError::Malformed {
            name: self.name().into(),
            reason: e.to_string(),
        })
    }

    pub fn decode(name: &str, body: &serde_json::Value) -> Result<Self, JobPayloadError> {
        let payload = match name {
            SEND_REMINDER_JOB => serde_json::from_value::<SendReminderPayload>(body.clone())
                .map(Self::SendReminder)
                .map_err(|e| JobPayloadError::Malformed {
                    name: name.into(),
                    reason: e.to_string(),
                })?,
            _ => return Err(JobPayloadError::UnknownJob(name.into())),
        };
        payload.validate()?;
        Ok(payload)
    }

    fn invalid(&self, reason: &str) -> JobPayloadError {
        JobPayloadError::Invalid {
            name: self.name().into(),
            reason: reason.into(),
        }
    }
}
