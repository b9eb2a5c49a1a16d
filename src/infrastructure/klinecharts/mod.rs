//! Bindings to the `klinecharts` rendering engine.

pub mod dto;
pub mod engine;

pub use dto::{KLineData, PaneOptions, to_kline_data};
pub use engine::KLineChartEngine;
