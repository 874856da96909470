use serde::{Deserialize, Serialize};

pub mod get_service_health {
    use super::*;

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub message: String,
        pub jobs: JobCountsDTO,
    }

    /// Number of reminder jobs per queue state
    #[derive(Deserialize, Serialize, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct JobCountsDTO {
        pub waiting: usize,
        pub delayed: usize,
        pub active: usize,
        pub failed: usize,
    }
}
