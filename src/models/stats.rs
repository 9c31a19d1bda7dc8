use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Counters for the current process run. Only the monitor writes to these, and
/// they are never reset or persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunStatistics {
    pub checks_count: u64,
    pub alerts_sent: u64,
    pub errors: u64,
    pub start_time: DateTime<Local>,
}

impl RunStatistics {
    pub fn new(start_time: DateTime<Local>) -> Self {
        Self {
            checks_count: 0,
            alerts_sent: 0,
            errors: 0,
            start_time,
        }
    }

    pub fn record_check(&mut self) {
        self.checks_count += 1;
        metrics::counter!("watcher_checks_total").increment(1);
    }

    pub fn record_alert(&mut self) {
        self.alerts_sent += 1;
        metrics::counter!("watcher_alerts_total").increment(1);
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
        metrics::counter!("watcher_errors_total").increment(1);
    }

    /// Whether the periodic summary should be logged after the current check.
    /// An `every` of zero is treated as one.
    pub fn summary_due(&self, every: u64) -> bool {
        self.checks_count > 0 && self.checks_count % every.max(1) == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} checks, {} alerts, {} errors",
            self.checks_count, self.alerts_sent, self.errors
        )
    }
}
