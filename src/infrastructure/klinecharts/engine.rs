use super::dto::{KLineData, PaneOptions, to_kline_data};
use crate::domain::{
    chart::{
        ChartEngine, ChartStyles, EngineFactory, IndicatorKind, LoadMoreCallback, PaneId,
        PanePlacement,
    },
    errors::AppError,
    logging::{LogComponent, get_logger},
    market_data::{Bar, Timestamp},
};
use crate::log_debug;
use gloo::utils::format::JsValueSerdeExt;
use serde::Serialize;
use wasm_bindgen::{JsCast, prelude::*};

#[wasm_bindgen]
extern "C" {
    /// Chart instance returned by `klinecharts.init`.
    pub type KChart;

    #[wasm_bindgen(js_namespace = klinecharts, js_name = init)]
    fn init_chart(container: &str) -> Option<KChart>;

    #[wasm_bindgen(js_namespace = klinecharts, js_name = dispose)]
    fn dispose_chart(container: &str);

    #[wasm_bindgen(method, js_name = setStyleOptions)]
    fn set_style_options(this: &KChart, options: &JsValue);

    #[wasm_bindgen(method, js_name = applyNewData)]
    fn apply_new_data(this: &KChart, data: &JsValue, more: bool);

    #[wasm_bindgen(method, js_name = updateData)]
    fn update_data(this: &KChart, data: &JsValue);

    #[wasm_bindgen(method)]
    fn resize(this: &KChart);

    #[wasm_bindgen(method, js_name = createTechnicalIndicator)]
    fn create_technical_indicator(
        this: &KChart,
        name: &str,
        is_stack: bool,
        options: &JsValue,
    ) -> JsValue;

    #[wasm_bindgen(method, js_name = removeTechnicalIndicator)]
    fn remove_technical_indicator(this: &KChart, pane_id: &str, name: &str);

    #[wasm_bindgen(method, js_name = loadMore)]
    fn load_more(this: &KChart, callback: &js_sys::Function);
}

/// `ChartEngine` backed by the `klinecharts` library loaded on the page.
pub struct KLineChartEngine {
    mount_id: String,
    chart: KChart,
    load_more: Option<Closure<dyn FnMut(JsValue)>>,
}

impl KLineChartEngine {
    pub fn init(mount_id: &str) -> Result<Self, AppError> {
        let chart = init_chart(mount_id).ok_or_else(|| {
            AppError::Browser(format!("klinecharts could not initialize on '{}'", mount_id))
        })?;
        Ok(Self { mount_id: mount_id.to_string(), chart, load_more: None })
    }

    pub fn factory() -> EngineFactory<Self> {
        Box::new(Self::init)
    }

    fn to_js<T: Serialize + ?Sized>(value: &T) -> Option<JsValue> {
        match JsValue::from_serde(value) {
            Ok(js) => Some(js),
            Err(e) => {
                get_logger().error(
                    LogComponent::Infrastructure("KLineChartEngine"),
                    &format!("❌ Cannot convert value for the engine: {}", e),
                );
                None
            }
        }
    }
}

impl ChartEngine for KLineChartEngine {
    fn apply_styles(&mut self, styles: &ChartStyles) {
        if let Some(options) = Self::to_js(styles) {
            self.chart.set_style_options(&options);
        }
    }

    fn apply_new_data(&mut self, bars: &[Bar], more: bool) {
        if let Some(data) = Self::to_js(&to_kline_data(bars)) {
            self.chart.apply_new_data(&data, more);
        }
    }

    fn update_data(&mut self, bar: &Bar) {
        if let Some(data) = Self::to_js(&KLineData::from(bar)) {
            self.chart.update_data(&data);
        }
    }

    fn resize(&mut self) {
        self.chart.resize();
    }

    fn create_indicator(
        &mut self,
        kind: IndicatorKind,
        placement: PanePlacement,
    ) -> Option<PaneId> {
        let name = kind.to_string();
        match placement {
            PanePlacement::Main => {
                let options = Self::to_js(&PaneOptions { id: PaneId::main().value().to_string() })?;
                let pane = self.chart.create_technical_indicator(&name, true, &options);
                pane.as_string().map(PaneId::new)
            }
            PanePlacement::Sub => {
                let pane = self.chart.create_technical_indicator(&name, false, &JsValue::UNDEFINED);
                pane.as_string().map(PaneId::new)
            }
        }
    }

    fn remove_indicator(&mut self, pane: &PaneId, kind: IndicatorKind) {
        self.chart.remove_technical_indicator(pane.value(), &kind.to_string());
    }

    fn set_load_more(&mut self, mut callback: LoadMoreCallback) {
        let closure = Closure::wrap(Box::new(move |timestamp: JsValue| {
            let oldest = timestamp.as_f64().map(|ms| Timestamp::from_millis(ms as u64));
            callback(oldest);
        }) as Box<dyn FnMut(JsValue)>);
        self.chart.load_more(closure.as_ref().unchecked_ref());
        self.load_more = Some(closure);
    }

    fn dispose(&mut self) {
        dispose_chart(&self.mount_id);
        self.load_more = None;
        log_debug!(
            LogComponent::Infrastructure("KLineChartEngine"),
            "Disposed klinecharts instance on '{}'",
            self.mount_id
        );
    }
}
