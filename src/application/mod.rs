//! Application layer: lifecycle orchestration on top of the domain contracts.

pub mod chart_adapter;
pub mod config;
pub mod indicator_registry;
pub mod lifecycle;
pub mod refresh_scheduler;
pub mod runtime;

pub use chart_adapter::{ChartEngineAdapter, ChartSession};
pub use config::ChartConfig;
pub use indicator_registry::{IndicatorRegistry, ToggleOutcome};
pub use lifecycle::ChartLifecycleController;
pub use refresh_scheduler::{PollState, RefreshScheduler};
pub use runtime::{Runtime, Spawner, Timer};
