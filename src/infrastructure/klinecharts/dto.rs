use crate::domain::market_data::Bar;
use serde::Serialize;

/// Bar as the `klinecharts` engine expects it (`timestamp` in ms).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KLineData {
    pub timestamp: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl From<&Bar> for KLineData {
    fn from(bar: &Bar) -> Self {
        Self {
            timestamp: bar.open_time.value(),
            open: bar.ohlcv.open.value(),
            high: bar.ohlcv.high.value(),
            low: bar.ohlcv.low.value(),
            close: bar.ohlcv.close.value(),
            volume: bar.ohlcv.volume.value(),
        }
    }
}

/// Options of `createTechnicalIndicator`; main indicators stack on an
/// existing pane.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaneOptions {
    pub id: String,
}

pub fn to_kline_data(bars: &[Bar]) -> Vec<KLineData> {
    bars.iter().map(KLineData::from).collect()
}
