use std::str::FromStr;

use gloo::utils::format::JsValueSerdeExt;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::{
    app::{SharedController, build_browser_controller, sync_active_indicators},
    application::{ChartConfig, ToggleOutcome},
    domain::{
        chart::{IndicatorKind, PaneId, PanePlacement},
        errors::{AppError, ConfigError, EngineStateError},
        logging::{LogComponent, get_logger},
        market_data::{Resolution, Symbol},
    },
    infrastructure::theme::read_theme_tokens,
};

/// Entry of `activeIndicators()`
#[derive(Debug, Clone, Serialize)]
struct ActiveIndicator {
    name: String,
    placement: PanePlacement,
    #[serde(rename = "paneId")]
    pane_id: Option<String>,
}

/// Imperative chart panel API for hosts that do not use the Leptos panel.
#[wasm_bindgen]
pub struct KlineChartApi {
    controller: SharedController,
}

#[wasm_bindgen]
impl KlineChartApi {
    /// `config` is a partial `ChartConfig` object; `undefined` falls back to the
    /// inline config block, then to the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<KlineChartApi, JsValue> {
        let config = ChartConfig::resolve(&config).map_err(AppError::from)?;
        Ok(Self { controller: build_browser_controller(&config) })
    }

    /// Create the chart on the configured mount element.
    pub fn mount(&self) -> Result<(), JsValue> {
        let token = self.controller.borrow().config().grid_color_token.clone();
        let theme = read_theme_tokens(&token);
        self.controller.borrow_mut().mount(&theme)?;
        sync_active_indicators(&self.controller.borrow());
        Ok(())
    }

    pub fn unmount(&self) {
        self.controller.borrow_mut().unmount();
    }

    /// `null`/empty clears the selection without touching the chart.
    #[wasm_bindgen(js_name = setMarket)]
    pub fn set_market(&self, symbol: Option<String>) {
        let symbol = symbol.and_then(|s| Symbol::new(s).ok());
        self.controller.borrow_mut().set_market(symbol);
    }

    /// Accepts the catalog labels (`"1m"`, `"1H"`, `"1D"`, ...).
    #[wasm_bindgen(js_name = setResolution)]
    pub fn set_resolution(&self, label: &str) -> Result<(), JsValue> {
        let resolution = Resolution::from_str(label).map_err(|_| invalid(format!("unknown resolution '{}'", label)))?;
        self.controller.borrow_mut().set_resolution(resolution);
        Ok(())
    }

    /// Returns whether the chart changed. Throws when no chart is mounted.
    #[wasm_bindgen(js_name = setIndicator)]
    pub fn set_indicator(&self, name: &str, placement: &str, enabled: bool) -> Result<bool, JsValue> {
        let kind = IndicatorKind::from_str(&name.to_uppercase())
            .map_err(|_| invalid(format!("unknown indicator '{}'", name)))?;
        let placement = match placement {
            "main" => PanePlacement::Main,
            "sub" => PanePlacement::Sub,
            other => return Err(invalid(format!("unknown placement '{}'", other))),
        };
        if self.controller.borrow().session().is_none() {
            return Err(AppError::from(EngineStateError::NotMounted).into());
        }

        let outcome = self.controller.borrow_mut().set_indicator(kind, placement, enabled);
        if outcome != ToggleOutcome::Unchanged {
            sync_active_indicators(&self.controller.borrow());
        }
        Ok(outcome != ToggleOutcome::Unchanged)
    }

    /// Report the container width; returns whether a resize was scheduled.
    #[wasm_bindgen(js_name = viewportResized)]
    pub fn viewport_resized(&self, width: f64) -> bool {
        self.controller.borrow_mut().on_viewport_width(width)
    }

    #[wasm_bindgen(js_name = activeIndicators)]
    pub fn active_indicators(&self) -> Result<JsValue, JsValue> {
        let controller = self.controller.borrow();
        let registry = controller.indicators();
        let active: Vec<ActiveIndicator> = registry
            .active()
            .into_iter()
            .map(|(kind, placement)| ActiveIndicator {
                name: kind.to_string(),
                placement,
                pane_id: match placement {
                    PanePlacement::Main => Some(PaneId::main().value().to_string()),
                    PanePlacement::Sub => registry.sub_pane(kind).map(|pane| pane.value().to_string()),
                },
            })
            .collect();

        JsValue::from_serde(&active).map_err(|e| {
            get_logger().error(
                LogComponent::Presentation("KlineChartApi"),
                &format!("❌ Cannot serialize indicators: {}", e),
            );
            JsValue::from_str(&e.to_string())
        })
    }
}

fn invalid(message: String) -> JsValue {
    AppError::from(ConfigError::InvalidParameter(message)).into()
}
