mod metrics;
mod notifier;

pub use metrics::{Metrics, ReminderMetricStatus};
pub use notifier::{INotifier, LogNotifier, ReminderMessage};
