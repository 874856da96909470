mod telemetry;

use clinic_reminders_api::Application;
use clinic_reminders_infra::{run_migration, setup_context};
use telemetry::{get_subscriber, init_subscriber};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    openssl_probe::init_ssl_cert_env_vars();

    let subscriber = get_subscriber("clinic_reminders".into(), "info".into());
    init_subscriber(subscriber);

    run_migration()
        .await
        .expect("Database migrations to succeed");
    let context = setup_context()
        .await
        .expect("Infrastructure to be reachable with the given environment");

    let app = Application::new(context).await?;
    app.start().await
}
