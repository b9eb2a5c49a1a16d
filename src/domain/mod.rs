//! Domain layer: market data vocabulary, the chart engine contract and the
//! ambient logging/error/event types shared by every other layer.

pub mod chart;
pub mod errors;
pub mod events;
pub mod logging;
pub mod market_data;
