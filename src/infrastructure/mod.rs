//! Browser-facing adapters for the domain contracts.

pub mod feed;
#[cfg(any(test, feature = "headless"))]
pub mod headless;
pub mod klinecharts;
pub mod runtime;
pub mod services;
pub mod theme;

pub use feed::HttpBarFeed;
#[cfg(any(test, feature = "headless"))]
pub use headless::{EngineCall, EngineJournal, HeadlessChartEngine};
pub use klinecharts::KLineChartEngine;
pub use runtime::{GlooTimer, WasmSpawner, browser_runtime};
pub use services::{BrowserTimeProvider, ConsoleLogger};
