use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::extractor::ProductExtractor;
use crate::fetcher::{FetchRequest, PageFetcher};
use crate::matching::TargetMatcher;
use crate::models::{MatchResult, ProductRecord, RunStatistics, TargetSpec};
use crate::plugins::traits::{NotificationEvent, NotifierPlugin};

/// Time source for the monitor loop, swappable in tests.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
    async fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Fetching,
    Extracting,
    Matching,
    Notifying,
    Sleeping,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    FetchFailed,
    NoProducts,
    NotFound { products: usize },
    Alerted { record: ProductRecord },
    NotifyFailed { record: ProductRecord },
}

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub catalog_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub check_interval: Duration,
    pub stats_log_every: u64,
}

impl MonitorSettings {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            catalog_url: config.catalog_url.clone(),
            user_agent: config.user_agent.clone(),
            request_timeout: config.request_timeout(),
            check_interval: config.check_interval(),
            stats_log_every: config.stats_log_every,
        }
    }
}

/// Polls the catalog on a fixed interval and alerts when the target shows up.
///
/// Cycles never overlap. A failing fetch or notification is logged and
/// counted, and the loop carries on with the next interval.
pub struct Monitor {
    fetcher: Arc<dyn PageFetcher>,
    notifier: Arc<dyn NotifierPlugin>,
    clock: Arc<dyn Clock>,
    extractor: ProductExtractor,
    matcher: TargetMatcher,
    target: TargetSpec,
    settings: MonitorSettings,
    stats: RunStatistics,
    state: MonitorState,
}

impl Monitor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        notifier: Arc<dyn NotifierPlugin>,
        clock: Arc<dyn Clock>,
        extractor: ProductExtractor,
        target: TargetSpec,
        settings: MonitorSettings,
    ) -> Self {
        let stats = RunStatistics::new(clock.now());

        Self {
            fetcher,
            notifier,
            clock,
            extractor,
            matcher: TargetMatcher::default(),
            target,
            settings,
            stats,
            state: MonitorState::Idle,
        }
    }

    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Run cycles until `shutdown` turns true. The signal is honoured before
    /// each cycle and while sleeping; a cycle in progress always completes.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> RunStatistics {
        info!("Starting catalog monitor...");
        info!(
            "Target: {} @ ${} (tolerance {})",
            self.target.name_pattern, self.target.target_price, self.target.tolerance
        );
        info!("Check interval: {} seconds", self.settings.check_interval.as_secs());

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.run_cycle().await;

            self.state = MonitorState::Sleeping;
            tokio::select! {
                _ = self.clock.sleep(self.settings.check_interval) => {}
                _ = wait_for_shutdown(&mut shutdown) => break,
            }
        }

        self.state = MonitorState::Stopped;
        info!("Monitor stopped. Final stats: {}", self.stats.summary());
        self.stats.clone()
    }

    /// One fetch, extract, match, notify pass.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.stats.record_check();
        info!(
            "Check #{} - Scraping {}...",
            self.stats.checks_count, self.settings.catalog_url
        );

        let outcome = self.check_catalog().await;

        if self.stats_summary_due() {
            info!("Stats: {}", self.stats.summary());
        }

        self.state = MonitorState::Idle;
        outcome
    }

    fn stats_summary_due(&self) -> bool {
        self.stats.summary_due(self.settings.stats_log_every)
    }

    async fn check_catalog(&mut self) -> CycleOutcome {
        self.state = MonitorState::Fetching;
        let request = FetchRequest::browser_like(
            &self.settings.catalog_url,
            &self.settings.user_agent,
            self.settings.request_timeout,
        );

        let body = match self.fetcher.fetch(&request).await {
            Ok(response) => {
                debug!(
                    "Fetched {} bytes (HTTP {}) in {}ms",
                    response.body.len(),
                    response.status,
                    response.response_time_ms
                );
                response.body
            }
            Err(e) => {
                error!("Error scraping catalog: {}", e);
                self.stats.record_error();
                return CycleOutcome::FetchFailed;
            }
        };

        let (products, result) = self.extract_and_match(&body);

        if products == 0 {
            warn!("No products extracted (may need to adjust scraping logic)");
            return CycleOutcome::NoProducts;
        }
        info!("Found {} products", products);

        match result {
            MatchResult::Found(record) => {
                info!("TARGET FOUND: {} @ {}", record.name, record.price_text);
                self.send_alert(record).await
            }
            MatchResult::NotFound => {
                info!("Target product not found");
                CycleOutcome::NotFound { products }
            }
        }
    }

    // Kept synchronous: the parsed page must not be held across an await.
    fn extract_and_match(&mut self, body: &str) -> (usize, MatchResult) {
        self.state = MonitorState::Extracting;
        let page = self.extractor.parse(body);

        if page.mentions(&self.target.name_pattern) {
            info!("Target product name found in page text");
        }

        let records: Vec<ProductRecord> = page.records().collect();
        self.state = MonitorState::Matching;

        let products = records.len();
        (products, self.matcher.find_match(records, &self.target))
    }

    async fn send_alert(&mut self, record: ProductRecord) -> CycleOutcome {
        self.state = MonitorState::Notifying;
        let event = NotificationEvent {
            product: record.clone(),
            link: self.settings.catalog_url.clone(),
            detected_at: self.clock.now(),
            stats: self.stats.clone(),
        };

        match self.notifier.notify(&event).await {
            Ok(result) if result.success => {
                self.stats.record_alert();
                debug!("Alert delivered (message id {:?})", result.message_id);
                CycleOutcome::Alerted { record }
            }
            Ok(result) => {
                error!(
                    "Error sending alert: {}",
                    result.error.unwrap_or_else(|| "unknown failure".to_string())
                );
                self.stats.record_error();
                CycleOutcome::NotifyFailed { record }
            }
            Err(e) => {
                error!("Error sending alert: {}", e);
                self.stats.record_error();
                CycleOutcome::NotifyFailed { record }
            }
        }
    }
}

/// Resolves once the flag is true. If the sender is gone the flag can never
/// change, so this never resolves.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            futures::future::pending::<()>().await;
        }
    }
}
