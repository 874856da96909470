use crate::shared::entity::{Entity, ID};

/// A `Patient` belongs to exactly one tenant (clinic) and is the
/// recipient of the reminders for their `Appointment`s.
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    pub id: ID,
    pub tenant_id: ID,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl Patient {
    pub fn new(tenant_id: ID, name: String, email: String, phone: Option<String>) -> Self {
        Self {
            id: Default::default(),
            tenant_id,
            name,
            email,
            phone,
        }
    }
}

impl Entity<ID> for Patient {
    fn id(&self) -> ID {
        self.id
    }
}
