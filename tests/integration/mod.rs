// Integration tests for Catalog Watcher
// These tests drive the monitor against mock catalog and Telegram servers

pub mod config_tests;

use async_trait::async_trait;
use catalog_watcher::{
    config::{MetricsConfig, SelectorConfig},
    extractor::ProductExtractor,
    fetcher::HttpFetcher,
    monitor::{Clock, Monitor, MonitorSettings},
    plugins::notifiers::{TelegramConfig, TelegramNotifier},
    AppConfig,
};
use chrono::{DateTime, Local, TimeZone};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const BOT_TOKEN: &str = "123456:test-token";
pub const CHAT_ID: &str = "987654";

pub const CATALOG_PAGE: &str = r#"
<html>
  <body>
    <section>
      <article class="item-card">
        <h2 class="item-name">Starter Pack</h2>
        <p class="item-price">$4.99</p>
      </article>
      <article class="item-card">
        <h2 class="item-name">Widget Pro</h2>
        <p class="item-price">$19.99</p>
      </article>
    </section>
  </body>
</html>
"#;

pub const SOLD_OUT_PAGE: &str = r#"
<html>
  <body>
    <article class="item-card">
      <h2 class="item-name">Starter Pack</h2>
      <p class="item-price">$4.99</p>
    </article>
  </body>
</html>
"#;

/// Config loading reads the whole process environment, so every load in this
/// binary and every environment change goes through this lock.
static ENV_LOCK: Mutex<()> = Mutex::new(());

pub fn lock_env() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn load_config(path: &Path) -> Result<AppConfig, config::ConfigError> {
    let _env = lock_env();
    AppConfig::load(path)
}

/// Test configuration pointing both the catalog and Telegram at mock servers
pub fn get_test_config(catalog_url: &str, telegram_api_url: &str) -> AppConfig {
    AppConfig {
        telegram_bot_token: BOT_TOKEN.to_string(),
        telegram_chat_id: CHAT_ID.to_string(),
        target_product: "widget pro".to_string(),
        target_price: 19.99,
        check_interval_seconds: 45,
        price_tolerance: 0.01,
        catalog_url: catalog_url.to_string(),
        user_agent: "CatalogWatcher-Test/1.0".to_string(),
        request_timeout_seconds: 5,
        notify_timeout_seconds: 5,
        telegram_api_url: telegram_api_url.to_string(),
        stats_log_every: 10,
        selectors: SelectorConfig::default(),
        metrics: MetricsConfig::default(),
    }
}

/// Clock that never actually waits. It records every requested sleep and
/// flips the shutdown flag once `stop_after` sleeps have been requested.
pub struct StepClock {
    now: DateTime<Local>,
    sleeps: Mutex<Vec<Duration>>,
    stop_after: usize,
    shutdown: watch::Sender<bool>,
}

impl StepClock {
    pub fn new(stop_after: usize, shutdown: watch::Sender<bool>) -> Self {
        Self {
            now: Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            sleeps: Mutex::new(Vec::new()),
            stop_after,
            shutdown,
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for StepClock {
    fn now(&self) -> DateTime<Local> {
        self.now
    }

    async fn sleep(&self, duration: Duration) {
        let count = {
            let mut sleeps = self.sleeps.lock().unwrap();
            sleeps.push(duration);
            sleeps.len()
        };
        if count >= self.stop_after {
            let _ = self.shutdown.send(true);
        }
    }
}

/// Build a monitor wired with the real HTTP fetcher and Telegram notifier
pub fn create_test_monitor(config: &AppConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Monitor> {
    let notifier = TelegramNotifier::new(TelegramConfig::from_app_config(config))?;

    Ok(Monitor::new(
        Arc::new(HttpFetcher::new()?),
        Arc::new(notifier),
        clock,
        ProductExtractor::new(&config.selectors)?,
        config.target(),
        MonitorSettings::from_app_config(config),
    ))
}

/// Serve `body` as the catalog page at `/`
pub async fn mount_catalog(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

pub fn send_message_path() -> String {
    format!("/bot{}/sendMessage", BOT_TOKEN)
}

/// Accept sendMessage calls, asserting the exact number on drop
pub async fn mount_telegram_ok(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(send_message_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": { "message_id": 42 }
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}
