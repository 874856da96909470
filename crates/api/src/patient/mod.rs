mod create_patient;
mod get_patients;

use actix_web::web;
use create_patient::create_patient_controller;
use get_patients::get_patients_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/patients", web::post().to(create_patient_controller));
    cfg.route("/patients", web::get().to(get_patients_controller));
}
