use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::models::{ProductRecord, RunStatistics};
use crate::utils::error::Result;

/// Everything a notifier needs to describe a detected target product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationEvent {
    pub product: ProductRecord,
    pub link: String,
    pub detected_at: DateTime<Local>,
    /// Statistics as they were when the match was found, before this alert
    /// is counted.
    pub stats: RunStatistics,
}

impl NotificationEvent {
    /// Ordinal of this alert within the current run.
    pub fn alert_number(&self) -> u64 {
        self.stats.alerts_sent + 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

/// Trait for implementing notification channels
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn plugin_type(&self) -> &str;

    /// Deliver one alert. Failures are reported, never retried here.
    async fn notify(&self, event: &NotificationEvent) -> Result<NotificationResult>;

    /// Check that the configured credentials are accepted by the channel.
    async fn test_connection(&self) -> Result<bool>;
}
