use chrono::{DateTime, Utc};
use clinic_reminders_domain::{Appointment, AppointmentStatus, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDTO {
    pub id: ID,
    pub tenant_id: ID,
    pub patient_id: ID,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub appointment_type: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ts).unwrap_or_default()
}

impl AppointmentDTO {
    pub fn new(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            tenant_id: appointment.tenant_id,
            patient_id: appointment.patient_id,
            date: to_datetime(appointment.date),
            appointment_type: appointment.appointment_type,
            status: appointment.status,
            created_at: to_datetime(appointment.created),
            updated_at: to_datetime(appointment.updated),
        }
    }
}
