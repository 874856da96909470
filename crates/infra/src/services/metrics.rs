use clinic_reminders_domain::{ReminderChannel, ID};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReminderMetricStatus {
    Success,
    Error,
}

impl ReminderMetricStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Business metrics of the reminder subsystem, rendered in the Prometheus
/// text exposition format.
#[derive(Default)]
pub struct Metrics {
    reminders_sent: Mutex<BTreeMap<(String, String, ReminderMetricStatus), u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_reminders_sent(
        &self,
        channel: ReminderChannel,
        tenant_id: &ID,
        status: ReminderMetricStatus,
    ) {
        let mut counters = self.reminders_sent.lock().unwrap();
        *counters
            .entry(Self::key(channel, tenant_id, status))
            .or_insert(0) += 1;
    }

    pub fn reminders_sent(
        &self,
        channel: ReminderChannel,
        tenant_id: &ID,
        status: ReminderMetricStatus,
    ) -> u64 {
        let counters = self.reminders_sent.lock().unwrap();
        counters
            .get(&Self::key(channel, tenant_id, status))
            .copied()
            .unwrap_or(0)
    }

    fn key(
        channel: ReminderChannel,
        tenant_id: &ID,
        status: ReminderMetricStatus,
    ) -> (String, String, ReminderMetricStatus) {
        (channel.to_string(), tenant_id.as_string(), status)
    }

    pub fn render(&self) -> String {
        let counters = self.reminders_sent.lock().unwrap();
        let mut out = String::new();
        out.push_str("# HELP reminders_sent_total Total number of reminders sent\n");
        out.push_str("# TYPE reminders_sent_total counter\n");
        for ((channel, tenant_id, status), value) in counters.iter() {
            // Writing to a String never fails
            let _ = writeln!(
                out,
                "reminders_sent_total{{type=\"{}\",tenantId=\"{}\",status=\"{}\"}} {}",
                channel,
                tenant_id,
                status.as_str(),
                value
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_per_label_set() {
        let metrics = Metrics::new();
        let tenant_id = ID::new();
        let other_tenant_id = ID::new();
        metrics.inc_reminders_sent(ReminderChannel::Email, &tenant_id, ReminderMetricStatus::Success);
        metrics.inc_reminders_sent(ReminderChannel::Email, &tenant_id, ReminderMetricStatus::Success);
        metrics.inc_reminders_sent(ReminderChannel::Email, &tenant_id, ReminderMetricStatus::Error);
        metrics.inc_reminders_sent(
            ReminderChannel::Email,
            &other_tenant_id,
            ReminderMetricStatus::Success,
        );

        assert_eq!(
            metrics.reminders_sent(ReminderChannel::Email, &tenant_id, ReminderMetricStatus::Success),
            2
        );
        assert_eq!(
            metrics.reminders_sent(ReminderChannel::Email, &tenant_id, ReminderMetricStatus::Error),
            1
        );
        assert_eq!(
            metrics.reminders_sent(ReminderChannel::Sms, &tenant_id, ReminderMetricStatus::Success),
            0
        );
    }

    #[test]
    fn renders_prometheus_text() {
        let metrics = Metrics::new();
        let tenant_id = ID::new();
        metrics.inc_reminders_sent(ReminderChannel::Email, &tenant_id, ReminderMetricStatus::Success);

        let out = metrics.render();
        assert!(out.contains("# TYPE reminders_sent_total counter"));
        assert!(out.contains(&format!(
            "reminders_sent_total{{type=\"EMAIL\",tenantId=\"{}\",status=\"success\"}} 1",
            tenant_id
        )));
    }
}
