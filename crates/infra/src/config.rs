use crate::queue::RetryPolicy;
use chrono_tz::Tz;
use clinic_reminders_domain::QuietHours;
use std::{fmt::Display, str::FromStr};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    /// Window during which reminders are held back until the next
    /// allowed instant
    pub quiet_hours: QuietHours,
    /// How long a worker may hold the lock for a single reminder. A worker
    /// that crashes while holding it blocks the reminder for at most this long.
    pub lock_ttl_millis: i64,
    /// How long a sent reminder is remembered as processed
    pub processed_ttl_millis: i64,
    /// Number of concurrent reminder worker loops
    pub worker_concurrency: usize,
    /// How long an idle worker loop sleeps before polling the queue again
    pub worker_poll_millis: u64,
    pub retry_policy: RetryPolicy,
    /// Active jobs claimed longer ago than this are handed out again
    pub stalled_timeout_millis: i64,
}

fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
{
    let value = match std::env::var(name) {
        Ok(value) => value,
        Err(_) => return default,
    };
    match value.parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!(
                "The given {}: {} is not valid, falling back to the default: {}.",
                name, value, default
            );
            default
        }
    }
}

/// Reads a duration given in seconds as millis. Values that are not positive
/// or do not fit in millis fall back to the default.
fn secs_as_millis(name: &str, value: Option<String>, default_secs: i64) -> i64 {
    let default = default_secs * 1000;
    let value = match value {
        Some(value) => value,
        None => return default,
    };
    let millis = value
        .parse::<i64>()
        .ok()
        .filter(|secs| *secs > 0)
        .and_then(|secs| secs.checked_mul(1000));
    match millis {
        Some(millis) => millis,
        None => {
            warn!(
                "The given {}: {} is not a positive number of seconds, falling back to the default: {}.",
                name, value, default_secs
            );
            default
        }
    }
}

fn env_secs_as_millis(name: &str, default_secs: i64) -> i64 {
    secs_as_millis(name, std::env::var(name).ok(), default_secs)
}

fn quiet_hours_from_env() -> QuietHours {
    let default = QuietHours::default();
    let timezone = match std::env::var("REMINDER_TIMEZONE") {
        Ok(tz) => match tz.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                warn!(
                    "The given REMINDER_TIMEZONE: {} is not a known timezone, falling back to: {}.",
                    tz, default.timezone
                );
                default.timezone
            }
        },
        Err(_) => {
            info!(
                "Did not find REMINDER_TIMEZONE environment variable. Quiet hours will use: {}",
                default.timezone
            );
            default.timezone
        }
    };
    let start_hour = env_or("QUIET_HOURS_START", default.start_hour);
    let end_hour = env_or("QUIET_HOURS_END", default.end_hour);
    match QuietHours::new(start_hour, end_hour, timezone) {
        Some(quiet_hours) => quiet_hours,
        None => {
            warn!(
                "Quiet hours {}-{} are not valid hours of the day, falling back to {}-{}.",
                start_hour, end_hour, default.start_hour, default.end_hour
            );
            QuietHours {
                timezone,
                ..default
            }
        }
    }
}

impl Config {
    pub fn new() -> Self {
        let retry_default = RetryPolicy::default();
        let worker_concurrency = match env_or("REMINDER_WORKER_CONCURRENCY", 4usize) {
            0 => {
                warn!("REMINDER_WORKER_CONCURRENCY must be at least 1, falling back to 1.");
                1
            }
            n => n,
        };
        Self {
            port: env_or("PORT", 5000),
            quiet_hours: quiet_hours_from_env(),
            lock_ttl_millis: env_secs_as_millis("REMINDER_LOCK_TTL_SECS", 60),
            processed_ttl_millis: env_secs_as_millis("REMINDER_PROCESSED_TTL_SECS", 60 * 60 * 24),
            worker_concurrency,
            worker_poll_millis: env_or("REMINDER_WORKER_POLL_MILLIS", 1000),
            retry_policy: RetryPolicy {
                max_attempts: env_or("JOB_MAX_ATTEMPTS", retry_default.max_attempts),
                backoff_millis: env_or("JOB_BACKOFF_MILLIS", retry_default.backoff_millis),
            },
            stalled_timeout_millis: env_or("JOB_STALLED_TIMEOUT_MILLIS", 1000i64 * 60 * 2),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
