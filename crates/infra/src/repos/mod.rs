mod appointment;
mod kv;
mod patient;
mod reminder;
mod shared;

pub use appointment::{IAppointmentRepo, InMemoryAppointmentRepo, PostgresAppointmentRepo};
pub use kv::{
    acquire_lock, is_processed, mark_processed, release_lock, IKVRepo, InMemoryKVRepo,
    KeyValue, Lock, PostgresKVRepo,
};
#[cfg(feature = "redis")]
pub use kv::RedisKVRepo;
pub use patient::{IPatientRepo, InMemoryPatientRepo, PostgresPatientRepo};
pub use reminder::{IReminderRepo, InMemoryReminderRepo, PostgresReminderRepo};

use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct Repos {
    pub appointments: Arc<dyn IAppointmentRepo>,
    pub patients: Arc<dyn IPatientRepo>,
    pub reminders: Arc<dyn IReminderRepo>,
    /// Shared store for reminder locks and processed markers
    pub kv: Arc<dyn IKVRepo>,
}

impl Repos {
    pub fn create_postgres(pool: PgPool) -> Self {
        Self {
            appointments: Arc::new(PostgresAppointmentRepo::new(pool.clone())),
            patients: Arc::new(PostgresPatientRepo::new(pool.clone())),
            reminders: Arc::new(PostgresReminderRepo::new(pool.clone())),
            kv: Arc::new(PostgresKVRepo::new(pool)),
        }
    }

    pub fn create_inmemory() -> Self {
        Self {
            appointments: Arc::new(InMemoryAppointmentRepo::new()),
            patients: Arc::new(InMemoryPatientRepo::new()),
            reminders: Arc::new(InMemoryReminderRepo::new()),
            kv: Arc::new(InMemoryKVRepo::new()),
        }
    }
}
