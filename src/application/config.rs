use crate::domain::chart::IndicatorKind;
use crate::domain::errors::ConfigError;
use crate::domain::market_data::Resolution;
use gloo::utils::format::JsValueSerdeExt;
use serde::Deserialize;
use std::time::Duration;
use wasm_bindgen::JsValue;

pub const DEFAULT_FEED_BASE_URL: &str = "/chart-data";
pub const DEFAULT_MOUNT_ID: &str = "update-k-line";

/// Panel configuration; every field has a default so hosts only override what
/// they need.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartConfig {
    pub feed_base_url: String,
    pub mount_id: String,
    pub poll_interval_ms: u64,
    /// Added to the open time of every polled bar to counter feed lag
    pub poll_skew_ms: u64,
    pub initial_history_days: u64,
    pub extended_history_days: u64,
    pub default_resolution: Resolution,
    pub default_sub_indicator: Option<IndicatorKind>,
    /// CSS custom property holding the grid color
    pub grid_color_token: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            feed_base_url: DEFAULT_FEED_BASE_URL.to_string(),
            mount_id: DEFAULT_MOUNT_ID.to_string(),
            poll_interval_ms: 10_000,
            poll_skew_ms: 10_000,
            initial_history_days: 14,
            extended_history_days: 365,
            default_resolution: Resolution::OneHour,
            default_sub_indicator: Some(IndicatorKind::Vol),
            grid_color_token: "--bkg-3".to_string(),
        }
    }
}

impl ChartConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: ChartConfig =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validated()
    }

    pub fn from_js(value: &JsValue) -> Result<Self, ConfigError> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        let config: ChartConfig =
            value.into_serde().map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validated()
    }

    /// Read an inline `<script type="application/json" id="...">` block.
    pub fn from_document(element_id: &str) -> Result<Self, ConfigError> {
        let text = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(element_id))
            .and_then(|el| el.text_content())
            .ok_or_else(|| ConfigError::MissingElement(element_id.to_string()))?;
        Self::from_json(&text)
    }

    /// Host object when given, else the inline `#update-k-line-config` block,
    /// else the defaults.
    pub fn resolve(value: &JsValue) -> Result<Self, ConfigError> {
        if !(value.is_undefined() || value.is_null()) {
            return Self::from_js(value);
        }
        default_when_missing(Self::from_document(&config_element_id()))
    }

    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.feed_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidParameter("feedBaseUrl is empty".to_string()));
        }
        if self.mount_id.trim().is_empty() {
            return Err(ConfigError::InvalidParameter("mountId is empty".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidParameter("pollIntervalMs must be > 0".to_string()));
        }
        if self.initial_history_days == 0 || self.extended_history_days == 0 {
            return Err(ConfigError::InvalidParameter(
                "history windows must be at least one day".to_string(),
            ));
        }
        if self.extended_history_days < self.initial_history_days {
            return Err(ConfigError::InvalidParameter(format!(
                "extendedHistoryDays ({}) < initialHistoryDays ({})",
                self.extended_history_days, self.initial_history_days
            )));
        }
        Ok(self)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Id of the inline JSON config block read when the host passes no object.
pub fn config_element_id() -> String {
    format!("{}-config", DEFAULT_MOUNT_ID)
}

fn default_when_missing(
    from_document: Result<ChartConfig, ConfigError>,
) -> Result<ChartConfig, ConfigError> {
    match from_document {
        Err(ConfigError::MissingElement(_)) => Ok(ChartConfig::default()),
        other => other,
    }
}
