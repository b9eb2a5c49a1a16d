use super::{ChartStyles, IndicatorKind, PaneId, PanePlacement};
use crate::domain::errors::AppError;
use crate::domain::market_data::{Bar, Timestamp};

/// Invoked by the engine when the user scrolls past the oldest resident bar;
/// receives that bar's open time.
pub type LoadMoreCallback = Box<dyn FnMut(Option<Timestamp>)>;

/// Contract the chart panel needs from a rendering engine.
///
/// One value is one engine instance bound to one mount target. Lifecycle
/// checks live in `ChartEngineAdapter`; implementations may assume they are
/// never called after [`ChartEngine::dispose`].
pub trait ChartEngine {
    fn apply_styles(&mut self, styles: &ChartStyles);

    /// Replace the whole dataset. `more` tells the engine whether older
    /// history can still be requested through the load-more callback.
    fn apply_new_data(&mut self, bars: &[Bar], more: bool);

    /// Append (or merge into the tail) one bar.
    fn update_data(&mut self, bar: &Bar);

    /// Re-measure the mount target and reflow.
    fn resize(&mut self);

    /// Returns the pane the indicator was created on, `None` if the engine
    /// refused it.
    fn create_indicator(&mut self, kind: IndicatorKind, placement: PanePlacement)
    -> Option<PaneId>;

    fn remove_indicator(&mut self, pane: &PaneId, kind: IndicatorKind);

    fn set_load_more(&mut self, callback: LoadMoreCallback);

    fn dispose(&mut self);
}

/// Creates engine instances for a mount target id.
pub type EngineFactory<E> = Box<dyn Fn(&str) -> Result<E, AppError>>;
