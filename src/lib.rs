use leptos::*;
use wasm_bindgen::prelude::*;

use crate::app::KlineChartPanel;
use crate::application::ChartConfig;
use crate::domain::errors::AppError;
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::market_data::Symbol;

#[macro_use]
pub mod macros;

pub mod domain;
pub mod infrastructure;
pub mod application;
pub mod presentation;

pub mod app;
pub mod event_utils;
pub mod global_state;

/// Install the browser logger, clock and panic hook
#[wasm_bindgen(start)]
pub fn initialize() {
    console_error_panic_hook::set_once();

    let console_logger = Box::new(infrastructure::services::ConsoleLogger::new_development());
    domain::logging::init_logger(console_logger);

    let browser_time_provider = Box::new(infrastructure::services::BrowserTimeProvider::new());
    domain::logging::init_time_provider(browser_time_provider);

    get_logger().info(
        LogComponent::Presentation("Initialize"),
        "🚀 Kline chart module initialized",
    );
}

/// Mount the Leptos chart panel into `<body>`. `config` is a partial
/// `ChartConfig` object; when `undefined`, the inline
/// `<script id="update-k-line-config">` block is used if present.
#[wasm_bindgen]
pub fn mount_kline_panel(config: JsValue) -> Result<(), JsValue> {
    let config = ChartConfig::resolve(&config).map_err(AppError::from)?;
    get_logger().info(
        LogComponent::Presentation("Initialize"),
        &format!("🧩 Mounting chart panel on '#{}'", config.mount_id),
    );
    leptos::mount_to_body(move || view! { <KlineChartPanel config /> });
    Ok(())
}

/// Host-driven market selection for the Leptos panel; `null` clears it.
#[wasm_bindgen]
pub fn set_selected_market(symbol: Option<String>) {
    let symbol = symbol.and_then(|s| Symbol::new(s).ok());
    global_state::selected_market().set(symbol);
}
