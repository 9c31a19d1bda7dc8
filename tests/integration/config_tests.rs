use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(value: serde_json::Value) -> anyhow::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
    write!(file, "{}", value)?;
    Ok(file)
}

#[tokio::test]
async fn test_loaded_config_drives_monitor() -> anyhow::Result<()> {
    let catalog = MockServer::start().await;
    let telegram = MockServer::start().await;
    mount_catalog(&catalog, CATALOG_PAGE).await;
    mount_telegram_ok(&telegram, 1).await;

    let file = write_config(serde_json::json!({
        "telegram_bot_token": BOT_TOKEN,
        "telegram_chat_id": CHAT_ID,
        "target_product": "Widget Pro",
        "target_price": 19.99,
        "catalog_url": format!("{}/", catalog.uri()),
        "telegram_api_url": telegram.uri(),
    }))?;

    let config = load_config(file.path())?;
    assert_eq!(config.check_interval_seconds, 30);
    assert_eq!(config.price_tolerance, 0.01);

    let (tx, _rx) = watch::channel(false);
    let mut monitor = create_test_monitor(&config, Arc::new(StepClock::new(usize::MAX, tx)))?;
    monitor.run_cycle().await;

    assert_eq!(monitor.stats().alerts_sent, 1);

    Ok(())
}

#[test]
fn test_environment_overrides_file_values() -> anyhow::Result<()> {
    let file = write_config(serde_json::json!({
        "telegram_bot_token": BOT_TOKEN,
        "telegram_chat_id": CHAT_ID,
        "target_product": "Widget Pro",
        "target_price": 19.99,
        "stats_log_every": 10,
    }))?;

    let loaded = {
        let _env = lock_env();
        // SAFETY: every environment access in this test binary holds the env lock.
        unsafe { std::env::set_var("WATCHER_STATS_LOG_EVERY", "3") };
        let loaded = AppConfig::load(file.path());
        unsafe { std::env::remove_var("WATCHER_STATS_LOG_EVERY") };
        loaded
    };

    assert_eq!(loaded?.stats_log_every, 3);
    Ok(())
}

#[test]
fn test_missing_target_price_is_rejected() -> anyhow::Result<()> {
    let file = write_config(serde_json::json!({
        "telegram_bot_token": BOT_TOKEN,
        "telegram_chat_id": CHAT_ID,
        "target_product": "Widget Pro",
    }))?;

    assert!(load_config(file.path()).is_err());
    Ok(())
}

#[test]
fn test_custom_selectors_are_used_by_extractor() -> anyhow::Result<()> {
    let file = write_config(serde_json::json!({
        "telegram_bot_token": BOT_TOKEN,
        "telegram_chat_id": CHAT_ID,
        "target_product": "Widget Pro",
        "target_price": 19.99,
        "selectors": {
            "container_tags": ["li"],
            "container_keywords": ["listing"],
            "name_tags": ["strong"],
            "name_keywords": ["label"],
            "price_tags": ["em"],
            "price_keywords": ["cost"]
        }
    }))?;

    let config = load_config(file.path())?;
    let extractor = ProductExtractor::new(&config.selectors)?;
    let page = extractor.parse(
        r#"<ul><li class="listing"><strong class="label">Widget Pro</strong><em class="cost">$19.99</em></li></ul>"#,
    );
    let records: Vec<_> = page.records().collect();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Widget Pro");
    assert_eq!(records[0].price_text, "$19.99");
    Ok(())
}
