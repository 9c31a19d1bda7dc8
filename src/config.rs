use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::models::{TargetSpec, DEFAULT_PRICE_TOLERANCE};

pub const DEFAULT_CATALOG_URL: &str = "https://accblox.net/";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub target_product: String,
    pub target_price: f64,
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
    #[serde(default = "default_tolerance")]
    pub price_tolerance: f64,
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_notify_timeout")]
    pub notify_timeout_seconds: u64,
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,
    #[serde(default = "default_stats_log_every")]
    pub stats_log_every: u64,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Tag and class-keyword lists driving the product extractor. Keywords are
/// matched as case-insensitive substrings of an element's `class` attribute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectorConfig {
    pub container_tags: Vec<String>,
    pub container_keywords: Vec<String>,
    pub name_tags: Vec<String>,
    pub name_keywords: Vec<String>,
    pub price_tags: Vec<String>,
    pub price_keywords: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            container_tags: strings(&["div", "article"]),
            container_keywords: strings(&["product", "item", "card"]),
            name_tags: strings(&["h1", "h2", "h3", "h4", "a"]),
            name_keywords: strings(&["title", "name", "product"]),
            price_tags: strings(&["span", "div", "p"]),
            price_keywords: strings(&["price"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9001,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn default_check_interval() -> u64 {
    30
}

fn default_tolerance() -> f64 {
    DEFAULT_PRICE_TOLERANCE
}

fn default_catalog_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_notify_timeout() -> u64 {
    10
}

fn default_telegram_api_url() -> String {
    DEFAULT_TELEGRAM_API_URL.to_string()
}

fn default_stats_log_every() -> u64 {
    10
}

impl AppConfig {
    /// Load the JSON config file at `path`, then apply `WATCHER_*` environment
    /// overrides (nested keys use `__`, e.g. `WATCHER_METRICS__ENABLED`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("WATCHER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram_bot_token.trim().is_empty() {
            return Err(ConfigError::Message("telegram_bot_token must not be empty".into()));
        }

        if self.telegram_chat_id.trim().is_empty() {
            return Err(ConfigError::Message("telegram_chat_id must not be empty".into()));
        }

        if self.target_product.trim().is_empty() {
            return Err(ConfigError::Message("target_product must not be empty".into()));
        }

        if !self.target_price.is_finite() || self.target_price < 0.0 {
            return Err(ConfigError::Message("target_price must be a non-negative number".into()));
        }

        if !self.price_tolerance.is_finite() || self.price_tolerance < 0.0 {
            return Err(ConfigError::Message("price_tolerance must be a non-negative number".into()));
        }

        if self.check_interval_seconds == 0 {
            return Err(ConfigError::Message("check_interval_seconds must be greater than 0".into()));
        }

        if self.request_timeout_seconds == 0 || self.notify_timeout_seconds == 0 {
            return Err(ConfigError::Message("Timeouts must be greater than 0".into()));
        }

        if self.stats_log_every == 0 {
            return Err(ConfigError::Message("stats_log_every must be greater than 0".into()));
        }

        if Url::parse(&self.catalog_url).is_err() {
            return Err(ConfigError::Message("Invalid catalog_url format".into()));
        }

        if Url::parse(&self.telegram_api_url).is_err() {
            return Err(ConfigError::Message("Invalid telegram_api_url format".into()));
        }

        let selector_lists = [
            ("container_tags", &self.selectors.container_tags),
            ("container_keywords", &self.selectors.container_keywords),
            ("name_tags", &self.selectors.name_tags),
            ("name_keywords", &self.selectors.name_keywords),
            ("price_tags", &self.selectors.price_tags),
            ("price_keywords", &self.selectors.price_keywords),
        ];
        for (name, list) in selector_lists {
            if list.is_empty() || list.iter().any(|v| v.trim().is_empty()) {
                return Err(ConfigError::Message(format!(
                    "selectors.{} must be a non-empty list of non-empty strings",
                    name
                )));
            }
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::Message("Metrics port must be greater than 0".into()));
        }

        Ok(())
    }

    pub fn target(&self) -> TargetSpec {
        TargetSpec::new(self.target_product.clone(), self.target_price)
            .with_tolerance(self.price_tolerance)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_seconds)
    }
}
