use actix_web::{http::header, web, HttpResponse};
use clinic_reminders_api_structs::get_service_health::*;
use clinic_reminders_infra::ClinicContext;
use tracing::error;

async fn status(ctx: web::Data<ClinicContext>) -> HttpResponse {
    let jobs = match ctx.queue.counts().await {
        Ok(counts) => JobCountsDTO {
            waiting: counts.waiting,
            delayed: counts.delayed,
            active: counts.active,
            failed: counts.failed,
        },
        Err(e) => {
            error!("Unable to count reminder jobs: {:?}", e);
            return HttpResponse::ServiceUnavailable().finish();
        }
    };
    HttpResponse::Ok().json(APIResponse {
        message: "Yo! We are up!\r\n".into(),
        jobs,
    })
}

async fn metrics(ctx: web::Data<ClinicContext>) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/plain; version=0.0.4"))
        .body(ctx.metrics.render())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(status));
}

pub fn configure_metrics_route(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(metrics));
}
