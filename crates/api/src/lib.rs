mod appointment;
mod dashboard;
mod error;
mod patient;
mod reminder;
mod shared;
mod status;

use actix_cors::Cors;
use actix_web::{dev::Server, middleware, web, App, HttpServer};
use clinic_reminders_infra::ClinicContext;
use std::net::TcpListener;
use tracing::info;
use tracing_actix_web::TracingLogger;

pub use error::ClinicError;
pub use reminder::{
    process_due_jobs, ReminderWorker, ScheduleReminderError, SendReminderError,
    SendReminderOutcome, SkipReason,
};

pub fn configure_server_api(cfg: &mut web::ServiceConfig) {
    appointment::configure_routes(cfg);
    dashboard::configure_routes(cfg);
    patient::configure_routes(cfg);
    status::configure_routes(cfg);
}

/// Routes of the whole application, the same ones the server serves
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/v1").configure(configure_server_api));
    status::configure_metrics_route(cfg);
}

pub struct Application {
    server: Server,
    port: u16,
    worker: ReminderWorker,
}

impl Application {
    pub async fn new(context: ClinicContext) -> Result<Self, std::io::Error> {
        let (server, port) = Application::configure_server(context.clone()).await?;
        let mut worker = ReminderWorker::new(context);
        worker.start();

        Ok(Self {
            server,
            port,
            worker,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    async fn configure_server(context: ClinicContext) -> Result<(Server, u16), std::io::Error> {
        let port = context.config.port;
        let address = format!("0.0.0.0:{}", port);
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();

        let server = HttpServer::new(move || {
            let ctx = context.clone();

            App::new()
                .wrap(Cors::permissive())
                .wrap(middleware::Compress::default())
                .wrap(TracingLogger::default())
                .app_data(web::Data::new(ctx))
                .configure(configure_app)
        })
        .listen(listener)?
        .workers(4)
        .run();

        Ok((server, port))
    }

    /// Serves requests until the server is shut down, then stops the reminder worker
    pub async fn start(mut self) -> Result<(), std::io::Error> {
        info!("Listening on port: {}", self.port);
        let res = self.server.await;
        self.worker.stop().await;
        res
    }
}
