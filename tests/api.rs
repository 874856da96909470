mod helpers;

use chrono::{DateTime, Utc};
use clinic_reminders_api_structs::{
    create_appointment, create_patient, get_appointments, get_dashboard, get_patients,
    get_service_health, AppointmentResponse, PatientResponse,
};
use clinic_reminders_domain::{
    reminder_dedupe_id, AppointmentStatus, ReminderStatus, ID, REMINDER_LEAD_MILLIS,
};
use clinic_reminders_infra::{ISys, JobState};
use helpers::setup::{eventually, spawn_app, TestApp};
use serde_json::json;

const HOUR: i64 = 1000 * 60 * 60;

fn datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ts).unwrap()
}

async fn create_patient(app: &TestApp) -> create_patient::APIResponse {
    let res = app
        .post(
            "/api/v1/patients",
            &json!({ "name": "Ola Nordmann", "email": "ola@example.com" }),
        )
        .await;
    assert_eq!(res.status().as_u16(), 201);
    res.json::<PatientResponse>().await.unwrap()
}

async fn create_appointment(
    app: &TestApp,
    patient_id: &ID,
    date: i64,
) -> create_appointment::APIResponse {
    let res = app
        .post(
            "/api/v1/appointments",
            &create_appointment::RequestBody {
                patient_id: *patient_id,
                date: datetime(date),
                appointment_type: "Checkup".into(),
            },
        )
        .await;
    assert_eq!(res.status().as_u16(), 201);
    res.json::<AppointmentResponse>().await.unwrap()
}

#[actix_web::test]
async fn test_status_ok() {
    let app = spawn_app().await;
    let res = app.get("/api/v1/").await;
    assert!(res.status().is_success());
    let body = res.json::<get_service_health::APIResponse>().await.unwrap();
    assert_eq!(body.jobs.failed, 0);
}

#[actix_web::test]
async fn test_requires_tenant_header() {
    let app = spawn_app().await;
    let res = reqwest::Client::new()
        .get(format!("{}/api/v1/appointments", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 401);
}

#[actix_web::test]
async fn test_create_appointment_schedules_reminder() {
    let app = spawn_app().await;
    let now = app.sys.get_timestamp_millis();
    let patient = create_patient(&app).await.patient;

    let appointment = create_appointment(&app, &patient.id, now + 48 * HOUR)
        .await
        .appointment;
    assert_eq!(appointment.tenant_id, app.tenant_id);
    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.date, datetime(now + 48 * HOUR));

    let job = app
        .ctx
        .queue
        .find(&reminder_dedupe_id(&appointment.id))
        .await
        .unwrap()
        .expect("Reminder job to be queued");
    assert_eq!(job.state, JobState::Delayed);
    assert_eq!(job.run_at, now + 48 * HOUR - REMINDER_LEAD_MILLIS);
}

#[actix_web::test]
async fn test_create_appointment_for_unknown_patient() {
    let app = spawn_app().await;
    let patient = create_patient(&app).await.patient;

    let other_tenant = app.as_tenant(ID::new());
    let res = other_tenant
        .post(
            "/api/v1/appointments",
            &json!({
                "patientId": patient.id,
                "date": datetime(app.sys.get_timestamp_millis() + 48 * HOUR),
                "type": "Checkup",
            }),
        )
        .await;
    assert_eq!(res.status().as_u16(), 404);
    assert_eq!(app.ctx.queue.counts().await.unwrap().delayed, 0);
}

#[actix_web::test]
async fn test_list_appointments_of_tenant() {
    let app = spawn_app().await;
    let now = app.sys.get_timestamp_millis();
    let patient = create_patient(&app).await.patient;
    let other_patient = create_patient(&app).await.patient;

    let later = create_appointment(&app, &patient.id, now + 72 * HOUR)
        .await
        .appointment;
    let earlier = create_appointment(&app, &other_patient.id, now + 48 * HOUR)
        .await
        .appointment;

    let res = app.get("/api/v1/appointments").await;
    assert!(res.status().is_success());
    let body = res.json::<get_appointments::APIResponse>().await.unwrap();
    assert_eq!(
        body.appointments.iter().map(|a| a.id).collect::<Vec<_>>(),
        vec![earlier.id, later.id]
    );

    let res = app
        .get(&format!("/api/v1/appointments?patientId={}", patient.id))
        .await;
    let body = res.json::<get_appointments::APIResponse>().await.unwrap();
    assert_eq!(body.appointments.len(), 1);
    assert_eq!(body.appointments[0].id, later.id);

    let res = app.as_tenant(ID::new()).get("/api/v1/appointments").await;
    let body = res.json::<get_appointments::APIResponse>().await.unwrap();
    assert!(body.appointments.is_empty());
}

#[actix_web::test]
async fn test_list_patients_of_tenant() {
    let app = spawn_app().await;
    let patient = create_patient(&app).await.patient;

    let res = app.get("/api/v1/patients").await;
    assert!(res.status().is_success());
    let body = res.json::<get_patients::APIResponse>().await.unwrap();
    assert_eq!(
        body.patients.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![patient.id]
    );

    let res = app.as_tenant(ID::new()).get("/api/v1/patients").await;
    let body = res.json::<get_patients::APIResponse>().await.unwrap();
    assert!(body.patients.is_empty());
}

#[actix_web::test]
async fn test_dashboard_stats() {
    let app = spawn_app().await;
    let now = app.sys.get_timestamp_millis();
    let patient = create_patient(&app).await.patient;
    create_appointment(&app, &patient.id, now + 48 * HOUR).await;
    create_appointment(&app, &patient.id, now + 72 * HOUR).await;

    let res = app.get("/api/v1/dashboard").await;
    assert!(res.status().is_success());
    let body = res.json::<get_dashboard::APIResponse>().await.unwrap();
    assert_eq!(
        body.stats,
        get_dashboard::DashboardStatsDTO {
            total_patients: 1,
            upcoming_appointments: 2,
            failed_reminders: 0,
        }
    );

    let res = app.as_tenant(ID::new()).get("/api/v1/dashboard").await;
    let body = res.json::<get_dashboard::APIResponse>().await.unwrap();
    assert_eq!(body.stats, get_dashboard::DashboardStatsDTO::default());
}

#[actix_web::test]
async fn test_confirm_and_reschedule_appointment() {
    let app = spawn_app().await;
    let now = app.sys.get_timestamp_millis();
    let patient = create_patient(&app).await.patient;
    let appointment = create_appointment(&app, &patient.id, now + 48 * HOUR)
        .await
        .appointment;

    let res = app
        .put(
            &format!("/api/v1/appointments/{}/confirm", appointment.id),
            &json!({}),
        )
        .await;
    assert!(res.status().is_success());
    let confirmed = res.json::<AppointmentResponse>().await.unwrap().appointment;
    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

    let res = app
        .put(
            &format!("/api/v1/appointments/{}/reschedule", appointment.id),
            &json!({ "date": datetime(now + 96 * HOUR) }),
        )
        .await;
    assert!(res.status().is_success());
    let rescheduled = res.json::<AppointmentResponse>().await.unwrap().appointment;
    assert_eq!(rescheduled.status, AppointmentStatus::Scheduled);
    assert_eq!(rescheduled.date, datetime(now + 96 * HOUR));

    let job = app
        .ctx
        .queue
        .find(&reminder_dedupe_id(&appointment.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.run_at, now + 72 * HOUR);

    let res = app
        .put(
            &format!("/api/v1/appointments/{}/confirm", ID::new()),
            &json!({}),
        )
        .await;
    assert_eq!(res.status().as_u16(), 404);
}

#[actix_web::test]
async fn test_worker_sends_due_reminder() {
    let app = spawn_app().await;
    let now = app.sys.get_timestamp_millis();
    let patient = create_patient(&app).await.patient;

    // Less than a day out, so the reminder is due right away
    let appointment = create_appointment(&app, &patient.id, now + 2 * HOUR)
        .await
        .appointment;

    let reminders = app.ctx.repos.reminders.clone();
    let appointment_id = appointment.id;
    let sent = eventually(|| {
        let reminders = reminders.clone();
        async move {
            reminders
                .find_by_appointment(&appointment_id)
                .await
                .unwrap()
                .len()
                == 1
        }
    })
    .await;
    assert!(sent, "Expected the reminder to be sent");

    let reminders = app
        .ctx
        .repos
        .reminders
        .find_by_appointment(&appointment.id)
        .await
        .unwrap();
    assert_eq!(reminders[0].status, ReminderStatus::Sent);

    let metrics = reqwest::get(format!("{}/metrics", app.address))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains(&format!(
        "reminders_sent_total{{type=\"EMAIL\",tenantId=\"{}\",status=\"success\"}} 1",
        app.tenant_id
    )));
}
