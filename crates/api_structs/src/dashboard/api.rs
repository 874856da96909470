use serde::{Deserialize, Serialize};

pub mod get_dashboard {
    use super::*;

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub stats: DashboardStatsDTO,
    }

    /// Counts of a single tenant
    #[derive(Debug, Deserialize, Serialize, Default, PartialEq)]
    #[serde(rename_all = "camelCase")]
    pub struct DashboardStatsDTO {
        pub total_patients: usize,
        /// Scheduled or confirmed appointments that have not started yet
        pub upcoming_appointments: usize,
        pub failed_reminders: usize,
    }
}
