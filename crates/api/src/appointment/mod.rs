mod confirm_appointment;
mod create_appointment;
mod get_appointments;
mod reschedule_appointment;
mod subscribers;

use actix_web::web;
use confirm_appointment::confirm_appointment_controller;
use create_appointment::create_appointment_controller;
use get_appointments::get_appointments_controller;
use reschedule_appointment::reschedule_appointment_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/appointments",
        web::post().to(create_appointment_controller),
    );
    cfg.route("/appointments", web::get().to(get_appointments_controller));
    cfg.route(
        "/appointments/{appointment_id}/confirm",
        web::put().to(confirm_appointment_controller),
    );
    cfg.route(
        "/appointments/{appointment_id}/reschedule",
        web::put().to(reschedule_appointment_controller),
    );
}
