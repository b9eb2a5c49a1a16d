use derive_more::{Deref, Display, From};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};

/// Where an indicator is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum PanePlacement {
    /// Overlay on the price pane
    #[display(fmt = "main")]
    #[serde(rename = "main")]
    Main,
    /// Own pane below the price pane
    #[display(fmt = "sub")]
    #[serde(rename = "sub")]
    Sub,
}

/// Technical indicators offered in the indicator modal
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    EnumIter,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum IndicatorKind {
    // price-pane overlays
    Ma,
    Ema,
    Sar,
    Boll,
    Sma,
    Bbi,
    // sub panes
    Vol,
    Macd,
    Rsi,
    Kdj,
    Obv,
    Cci,
    Wr,
    Dmi,
    Mtm,
    Emv,
}

impl IndicatorKind {
    /// Placement the indicator is listed under in the modal.
    pub fn natural_placement(&self) -> PanePlacement {
        match self {
            Self::Ma | Self::Ema | Self::Sar | Self::Boll | Self::Sma | Self::Bbi => {
                PanePlacement::Main
            }
            _ => PanePlacement::Sub,
        }
    }

    pub fn main_catalog() -> Vec<IndicatorKind> {
        Self::iter().filter(|k| k.natural_placement() == PanePlacement::Main).collect()
    }

    pub fn sub_catalog() -> Vec<IndicatorKind> {
        Self::iter().filter(|k| k.natural_placement() == PanePlacement::Sub).collect()
    }
}

/// Opaque pane identity handed out by the chart engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deref, From, Display)]
#[display(fmt = "{}", _0)]
pub struct PaneId(String);

/// All main indicators share the price pane.
pub const MAIN_PANE_ID: &str = "candle_pane";

impl PaneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn main() -> Self {
        Self(MAIN_PANE_ID.to_string())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Color tokens read from the ambient style system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeTokens {
    pub grid_color: String,
}

impl ThemeTokens {
    pub fn new(grid_color: impl Into<String>) -> Self {
        Self { grid_color: grid_color.into().trim().to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub style: &'static str,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridStyle {
    pub show: bool,
    pub horizontal: LineStyle,
    pub vertical: LineStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipStyle {
    pub labels: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleStyle {
    pub tooltip: TooltipStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisLineStyle {
    pub show: bool,
    pub color: String,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisStyle {
    #[serde(rename = "axisLine")]
    pub axis_line: AxisLineStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeparatorStyle {
    pub size: u32,
    pub color: String,
}

/// Style options applied to a freshly created chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartStyles {
    pub grid: GridStyle,
    pub candle: CandleStyle,
    #[serde(rename = "xAxis")]
    pub x_axis: AxisStyle,
    #[serde(rename = "yAxis")]
    pub y_axis: AxisStyle,
    pub separator: SeparatorStyle,
}

impl ChartStyles {
    pub fn from_theme(theme: &ThemeTokens) -> Self {
        let color = theme.grid_color.clone();
        let solid = || LineStyle { style: "solid", color: color.clone() };
        let axis = || AxisStyle {
            axis_line: AxisLineStyle { show: true, color: color.clone(), size: 1 },
        };

        Self {
            grid: GridStyle { show: true, horizontal: solid(), vertical: solid() },
            candle: CandleStyle {
                tooltip: TooltipStyle { labels: vec!["T: ", "O: ", "C: ", "H: ", "L: ", "V: "] },
            },
            x_axis: axis(),
            y_axis: axis(),
            separator: SeparatorStyle { size: 2, color: color.clone() },
        }
    }
}
