use chrono::{TimeZone, Utc};
use clinic_reminders_api::Application;
use clinic_reminders_api_structs::TENANT_HEADER;
use clinic_reminders_domain::ID;
use clinic_reminders_infra::{ClinicContext, ManualSys};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub struct TestApp {
    /// Shares every store with the running application
    pub ctx: ClinicContext,
    pub sys: Arc<ManualSys>,
    pub address: String,
    pub tenant_id: ID,
    client: reqwest::Client,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header(TENANT_HEADER, self.tenant_id.as_string())
            .send()
            .await
            .expect("Request to be sent")
    }

    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header(TENANT_HEADER, self.tenant_id.as_string())
            .json(body)
            .send()
            .await
            .expect("Request to be sent")
    }

    pub async fn put<T: Serialize>(&self, path: &str, body: &T) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .header(TENANT_HEADER, self.tenant_id.as_string())
            .json(body)
            .send()
            .await
            .expect("Request to be sent")
    }

    pub fn as_tenant(&self, tenant_id: ID) -> Self {
        Self {
            ctx: self.ctx.clone(),
            sys: self.sys.clone(),
            address: self.address.clone(),
            tenant_id,
            client: self.client.clone(),
        }
    }
}

/// Midday, outside of quiet hours
pub fn midday() -> i64 {
    Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0)
        .unwrap()
        .timestamp_millis()
}

// Launch the application as a background task
pub async fn spawn_app() -> TestApp {
    let mut ctx = ClinicContext::create_inmemory();
    ctx.config.port = 0; // Random port
    ctx.config.worker_poll_millis = 10;
    let sys = Arc::new(ManualSys::new(midday()));
    ctx.sys = sys.clone();

    let application = Application::new(ctx.clone())
        .await
        .expect("Failed to build application.");

    let address = format!("http://localhost:{}", application.port());
    let _ = actix_web::rt::spawn(async move {
        application
            .start()
            .await
            .expect("Expected application to start");
    });

    TestApp {
        ctx,
        sys,
        address,
        tenant_id: ID::new(),
        client: reqwest::Client::new(),
    }
}

/// Polls `check` until it holds or about two seconds have passed
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        actix_web::rt::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
