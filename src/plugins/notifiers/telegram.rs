use crate::config::AppConfig;
use crate::plugins::traits::{NotificationEvent, NotificationResult, NotifierPlugin};
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const CHANNEL: &str = "telegram";

/// Local ISO 8601 without offset; microseconds only when non-zero.
fn iso_timestamp(time: &DateTime<Local>) -> String {
    if time.timestamp_subsec_micros() == 0 {
        time.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        time.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_url: String,
    pub timeout: Duration,
}

impl TelegramConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        TelegramConfig {
            bot_token: config.telegram_bot_token.clone(),
            chat_id: config.telegram_chat_id.clone(),
            api_url: config.telegram_api_url.clone(),
            timeout: config.notify_timeout(),
        }
    }
}

/// Envelope of every Bot API reply.
#[derive(Debug, Deserialize)]
struct TelegramReply {
    ok: bool,
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(TelegramNotifier { client, config })
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    fn format_message(&self, event: &NotificationEvent) -> String {
        format!(
            "URGENT ALERT - TARGET PRODUCT FOUND!\n\
             \n\
             Product: {name}\n\
             Price: {price}\n\
             Link: {link}\n\
             Detected: {detected}\n\
             \n\
             ACTION REQUIRED - Check website immediately!\n\
             \n\
             Statistics:\n\
             - Total checks: {checks}\n\
             - Alerts sent: {alerts}\n\
             - Running since: {since}",
            name = event.product.name,
            price = event.product.price_text,
            link = event.link,
            detected = event.detected_at.format("%Y-%m-%d %H:%M:%S"),
            checks = event.stats.checks_count,
            alerts = event.alert_number(),
            since = iso_timestamp(&event.stats.start_time),
        )
    }

    // Request errors embed the URL, which carries the bot token.
    fn transport_error(error: reqwest::Error) -> AppError {
        AppError::notify(CHANNEL, error.without_url().to_string())
    }
}

#[async_trait]
impl NotifierPlugin for TelegramNotifier {
    fn name(&self) -> &str {
        "Telegram Notifier"
    }

    fn plugin_type(&self) -> &str {
        CHANNEL
    }

    async fn notify(&self, event: &NotificationEvent) -> Result<NotificationResult> {
        let payload = json!({
            "chat_id": self.config.chat_id,
            "text": self.format_message(event),
        });

        let response = self
            .client
            .post(self.endpoint("sendMessage"))
            .json(&payload)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(Self::transport_error)?;
        let reply = serde_json::from_str::<TelegramReply>(&body).ok();

        if !status.is_success() || !reply.as_ref().map(|r| r.ok).unwrap_or(false) {
            let description = reply
                .and_then(|r| r.description)
                .unwrap_or_else(|| body.chars().take(200).collect());
            return Err(AppError::notify(
                CHANNEL,
                format!("HTTP {}: {}", status.as_u16(), description),
            ));
        }

        let message_id = reply
            .and_then(|r| r.result)
            .and_then(|result| result.get("message_id").cloned())
            .map(|id| id.to_string());

        tracing::info!("Telegram alert sent for {}", event.product.name);

        Ok(NotificationResult {
            success: true,
            message_id,
            error: None,
        })
    }

    async fn test_connection(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.endpoint("getMe"))
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let reply: TelegramReply = response.json().await.map_err(Self::transport_error)?;
        Ok(reply.ok)
    }
}
