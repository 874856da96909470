mod config;
mod queue;
mod repos;
mod services;
mod system;

pub use config::Config;
pub use queue::{
    EnqueueOptions, EnqueueResult, IJobQueue, InMemoryJobQueue, JobCounts, JobState,
    PostgresJobQueue, QueuedJob, RetryPolicy,
};
pub use repos::*;
pub use services::*;
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
pub use system::{ISys, ManualSys, RealSys};
use tracing::info;

/// Everything the use cases and the reminder worker need, constructed once
/// at startup and passed around explicitly.
#[derive(Clone)]
pub struct ClinicContext {
    pub repos: Repos,
    pub queue: Arc<dyn IJobQueue>,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub notifier: Arc<dyn INotifier>,
    pub metrics: Arc<Metrics>,
}

impl ClinicContext {
    pub fn create_inmemory() -> Self {
        Self {
            repos: Repos::create_inmemory(),
            queue: Arc::new(InMemoryJobQueue::new()),
            config: Config::new(),
            sys: Arc::new(RealSys {}),
            notifier: Arc::new(LogNotifier),
            metrics: Arc::new(Metrics::new()),
        }
    }

    fn create_postgres(pool: PgPool) -> Self {
        Self {
            repos: Repos::create_postgres(pool.clone()),
            queue: Arc::new(PostgresJobQueue::new(pool, REMINDER_QUEUE)),
            config: Config::new(),
            sys: Arc::new(RealSys {}),
            notifier: Arc::new(LogNotifier),
            metrics: Arc::new(Metrics::new()),
        }
    }
}

/// Name of the queue the reminder jobs are stored in
pub const REMINDER_QUEUE: &str = "reminders";

const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";
const REDIS_CONNECTION_STRING: &str = "REDIS_URL";

/// Will setup the infrastructure context given the environment.
/// Without `DATABASE_URL` every store lives in memory of this process.
pub async fn setup_context() -> anyhow::Result<ClinicContext> {
    let mut ctx = match std::env::var(PSQL_CONNECTION_STRING) {
        Ok(connection_string) => {
            let pool = connect(&connection_string).await?;
            ClinicContext::create_postgres(pool)
        }
        Err(_) => {
            info!(
                "Did not find {} environment variable. Going to use inmemory stores.",
                PSQL_CONNECTION_STRING
            );
            ClinicContext::create_inmemory()
        }
    };

    if let Ok(redis_url) = std::env::var(REDIS_CONNECTION_STRING) {
        use_redis_kv(&mut ctx, &redis_url).await?;
    }

    Ok(ctx)
}

#[cfg(feature = "redis")]
async fn use_redis_kv(ctx: &mut ClinicContext, redis_url: &str) -> anyhow::Result<()> {
    info!("Reminder locks and processed markers will be stored in redis");
    ctx.repos.kv = Arc::new(RedisKVRepo::new(redis_url).await?);
    Ok(())
}

#[cfg(not(feature = "redis"))]
async fn use_redis_kv(_ctx: &mut ClinicContext, _redis_url: &str) -> anyhow::Result<()> {
    tracing::warn!(
        "{} is set but the redis feature is not enabled, it will be ignored",
        REDIS_CONNECTION_STRING
    );
    Ok(())
}

async fn connect(connection_string: &str) -> Result<PgPool, sqlx::Error> {
    info!("DB CHECKING CONNECTION ...");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(connection_string)
        .await?;
    info!("DB CHECKING CONNECTION ... [done]");
    Ok(pool)
}

/// Runs the database migrations. Does nothing without `DATABASE_URL`.
pub async fn run_migration() -> Result<(), MigrateError> {
    let connection_string = match std::env::var(PSQL_CONNECTION_STRING) {
        Ok(connection_string) => connection_string,
        Err(_) => return Ok(()),
    };
    let pool = connect(&connection_string).await?;
    sqlx::migrate!().run(&pool).await
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;

    /// Pool on `DATABASE_URL` with the migrations applied. Without the variable
    /// the Postgres variants of the store tests are skipped.
    pub async fn postgres_pool() -> Option<PgPool> {
        let connection_string = std::env::var(PSQL_CONNECTION_STRING).ok()?;
        let pool = connect(&connection_string)
            .await
            .expect("Test database to be reachable");
        sqlx::migrate!()
            .run(&pool)
            .await
            .expect("Migrations to succeed");
        Some(pool)
    }

    /// In-memory repos and, with `DATABASE_URL`, Postgres repos
    pub async fn create_repos() -> Vec<Repos> {
        let mut repos = vec![Repos::create_inmemory()];
        if let Some(pool) = postgres_pool().await {
            repos.push(Repos::create_postgres(pool));
        }
        repos
    }
}
