#![cfg(target_arch = "wasm32")]

use kline_chart_wasm::application::config::config_element_id;
use kline_chart_wasm::application::{ChartConfig, Timer};
use kline_chart_wasm::domain::logging::{LogComponent, LogLevel, Logger, TimeProvider};
use kline_chart_wasm::infrastructure::theme::{FALLBACK_GRID_COLOR, read_theme_tokens};
use kline_chart_wasm::infrastructure::{BrowserTimeProvider, ConsoleLogger, GlooTimer};
use std::time::Duration;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn console_logger_accepts_every_level() {
    let logger = ConsoleLogger::new(LogLevel::Trace);
    logger.trace(LogComponent::Infrastructure("BrowserTest"), "trace");
    logger.info(LogComponent::Infrastructure("BrowserTest"), "📊 info");
    logger.error(LogComponent::Infrastructure("BrowserTest"), "error");
}

#[wasm_bindgen_test]
fn browser_clock_is_in_milliseconds() {
    let clock = BrowserTimeProvider::new();
    let now = clock.current_timestamp();
    // after 2020-01-01
    assert!(now > 1_577_836_800_000);
    assert!(!clock.format_timestamp(now).is_empty());
}

#[wasm_bindgen_test]
async fn gloo_timer_resolves() {
    let started = js_sys::Date::now();
    GlooTimer.sleep(Duration::from_millis(20)).await;
    assert!(js_sys::Date::now() - started >= 15.0);
}

#[wasm_bindgen_test]
fn missing_theme_token_falls_back() {
    let theme = read_theme_tokens("--kline-test-undefined-token");
    assert_eq!(theme.grid_color, FALLBACK_GRID_COLOR);
}

#[wasm_bindgen_test]
fn config_from_js_object() {
    let value = js_sys::JSON::parse(r#"{"feedBaseUrl":"https://feed.test","mountId":"chart"}"#)
        .unwrap();
    let config = ChartConfig::from_js(&value).unwrap();
    assert_eq!(config.feed_base_url, "https://feed.test");
    assert_eq!(config.mount_id, "chart");

    assert_eq!(ChartConfig::from_js(&JsValue::UNDEFINED).unwrap(), ChartConfig::default());
}

#[wasm_bindgen_test]
fn undefined_config_reads_the_inline_block() {
    let document = web_sys::window().unwrap().document().unwrap();
    let script = document.create_element("script").unwrap();
    script.set_id(&config_element_id());
    script.set_attribute("type", "application/json").unwrap();
    script.set_text_content(Some(r#"{"pollIntervalMs":2500,"defaultResolution":"1D"}"#));
    document.body().unwrap().append_child(&script).unwrap();

    let config = ChartConfig::resolve(&JsValue::UNDEFINED).unwrap();
    assert_eq!(config.poll_interval_ms, 2500);
    assert_eq!(config.default_resolution.label(), "1D");

    // an explicit object wins over the inline block
    let value = js_sys::JSON::parse(r#"{"pollIntervalMs":700}"#).unwrap();
    assert_eq!(ChartConfig::resolve(&value).unwrap().poll_interval_ms, 700);

    script.remove();
    assert_eq!(ChartConfig::resolve(&JsValue::NULL).unwrap(), ChartConfig::default());
}
