use crate::domain::{
    chart::{ChartEngine, ChartStyles, EngineFactory, IndicatorKind, LoadMoreCallback, PaneId, PanePlacement},
    errors::{AppError, EngineStateError},
    events::{ChartEvent, EventDispatcher},
    logging::{LogComponent, get_logger},
    market_data::{Bar, Timestamp, merge_history, normalize_bars},
};
use crate::log_debug;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Handle to one live engine instance.
///
/// Cheap to clone; holders never own the engine. Every adapter call checks the
/// handle against the live session, so a handle outliving `dispose` can only
/// be used to ask [`ChartEngineAdapter::is_live`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSession {
    id: u64,
    mount_id: String,
}

impl ChartSession {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn mount_id(&self) -> &str {
        &self.mount_id
    }
}

struct LiveSession<E> {
    session: ChartSession,
    engine: E,
    resident: Vec<Bar>,
    indicators: BTreeSet<(PaneId, IndicatorKind)>,
}

/// Owns the single chart engine instance and serializes every mutation of it.
pub struct ChartEngineAdapter<E: ChartEngine> {
    factory: EngineFactory<E>,
    live: Option<LiveSession<E>>,
    next_session_id: u64,
    events: Option<Rc<dyn EventDispatcher>>,
}

impl<E: ChartEngine> ChartEngineAdapter<E> {
    pub fn new(factory: EngineFactory<E>) -> Self {
        Self { factory, live: None, next_session_id: 1, events: None }
    }

    pub fn with_events(mut self, events: Rc<dyn EventDispatcher>) -> Self {
        self.set_events(events);
        self
    }

    pub fn set_events(&mut self, events: Rc<dyn EventDispatcher>) {
        self.events = Some(events);
    }

    /// Create a new engine instance on `mount_id`. An instance that is still
    /// live is disposed first.
    pub fn initialize(&mut self, mount_id: &str) -> Result<ChartSession, AppError> {
        if let Some(previous) = self.live.as_ref().map(|live| live.session.clone()) {
            get_logger().warn(
                LogComponent::Application("ChartAdapter"),
                &format!(
                    "♻️ Re-initializing: disposing session #{} on '{}' before mounting '{}'",
                    previous.id, previous.mount_id, mount_id
                ),
            );
            self.dispose(&previous);
        }

        let engine = (self.factory)(mount_id)?;
        let session = ChartSession { id: self.next_session_id, mount_id: mount_id.to_string() };
        self.next_session_id += 1;
        self.live = Some(LiveSession {
            session: session.clone(),
            engine,
            resident: Vec::new(),
            indicators: BTreeSet::new(),
        });

        get_logger().info(
            LogComponent::Application("ChartAdapter"),
            &format!("🚀 Chart session #{} mounted on '{}'", session.id, mount_id),
        );
        self.publish(ChartEvent::SessionStarted {
            session: session.id,
            mount_id: mount_id.to_string(),
        });
        Ok(session)
    }

    pub fn is_live(&self, session: &ChartSession) -> bool {
        self.live.as_ref().is_some_and(|live| live.session == *session)
    }

    pub fn live_session(&self) -> Option<&ChartSession> {
        self.live.as_ref().map(|live| &live.session)
    }

    pub fn apply_styles(&mut self, session: &ChartSession, styles: &ChartStyles) {
        self.live_mut(session).engine.apply_styles(styles);
    }

    /// Swap the whole dataset; resets the append guard to the new tail.
    pub fn replace_dataset(&mut self, session: &ChartSession, bars: Vec<Bar>) -> usize {
        let bars = normalize_bars(bars);
        let live = self.live_mut(session);
        live.engine.apply_new_data(&bars, true);
        live.resident = bars;
        let count = live.resident.len();
        let id = live.session.id;
        self.publish(ChartEvent::DatasetReplaced { session: id, bar_count: count });
        count
    }

    /// Merge an older history batch under the resident bars. The engine is
    /// told afterwards that no further history can be loaded.
    pub fn merge_history(&mut self, session: &ChartSession, history: Vec<Bar>) -> usize {
        let live = self.live_mut(session);
        let merged = merge_history(&live.resident, history);
        live.engine.apply_new_data(&merged, false);
        live.resident = merged;
        let count = live.resident.len();
        let id = live.session.id;
        self.publish(ChartEvent::DatasetReplaced { session: id, bar_count: count });
        count
    }

    /// Append one bar at the tail. Returns `false` (and leaves the dataset
    /// untouched) when the bar does not lie strictly after the resident tail.
    pub fn append_bar(&mut self, session: &ChartSession, bar: Bar) -> bool {
        let live = self.live_mut(session);
        if let Some(tail) = live.resident.last().map(|b| b.open_time) {
            if bar.open_time <= tail {
                log_debug!(
                    LogComponent::Application("ChartAdapter"),
                    "⏭️ Ignoring bar at {} (tail is {})",
                    bar.open_time.value(),
                    tail.value()
                );
                return false;
            }
        }
        live.engine.update_data(&bar);
        live.resident.push(bar);
        true
    }

    pub fn resize(&mut self, session: &ChartSession) {
        self.live_mut(session).engine.resize();
    }

    pub fn create_indicator(
        &mut self,
        session: &ChartSession,
        kind: IndicatorKind,
        placement: PanePlacement,
    ) -> Option<PaneId> {
        let live = self.live_mut(session);
        let pane = live.engine.create_indicator(kind, placement)?;
        live.indicators.insert((pane.clone(), kind));
        Some(pane)
    }

    /// Removing an indicator that is not on `pane` is a no-op.
    pub fn remove_indicator(&mut self, session: &ChartSession, pane: &PaneId, kind: IndicatorKind) {
        let live = self.live_mut(session);
        if live.indicators.remove(&(pane.clone(), kind)) {
            live.engine.remove_indicator(pane, kind);
        } else {
            log_debug!(
                LogComponent::Application("ChartAdapter"),
                "No {} indicator on pane '{}', nothing to remove",
                kind,
                pane
            );
        }
    }

    pub fn set_load_more(&mut self, session: &ChartSession, callback: LoadMoreCallback) {
        self.live_mut(session).engine.set_load_more(callback);
    }

    /// Release the engine. Must be called exactly once per session.
    pub fn dispose(&mut self, session: &ChartSession) {
        self.live_mut(session);
        if let Some(mut live) = self.live.take() {
            live.engine.dispose();
            get_logger().info(
                LogComponent::Application("ChartAdapter"),
                &format!("🧹 Chart session #{} disposed", live.session.id),
            );
            self.publish(ChartEvent::SessionDisposed { session: live.session.id });
        }
    }

    pub fn dataset(&self, session: &ChartSession) -> &[Bar] {
        &self.live_ref(session).resident
    }

    pub fn tail(&self, session: &ChartSession) -> Option<Timestamp> {
        self.live_ref(session).resident.last().map(|bar| bar.open_time)
    }

    pub fn head(&self, session: &ChartSession) -> Option<Timestamp> {
        self.live_ref(session).resident.first().map(|bar| bar.open_time)
    }

    fn live_ref(&self, session: &ChartSession) -> &LiveSession<E> {
        match self.live.as_ref() {
            Some(live) if live.session == *session => live,
            other => Self::contract_violation(session, other.map(|l| l.session.id)),
        }
    }

    fn live_mut(&mut self, session: &ChartSession) -> &mut LiveSession<E> {
        match self.live.as_mut() {
            Some(live) if live.session == *session => live,
            other => Self::contract_violation(session, other.map(|l| l.session.id)),
        }
    }

    fn contract_violation(session: &ChartSession, live_id: Option<u64>) -> ! {
        let error = match live_id {
            None => EngineStateError::Disposed { session: session.id },
            Some(expected) => {
                EngineStateError::ForeignSession { expected: Some(expected), actual: session.id }
            }
        };
        let error = AppError::from(error);
        get_logger().error(LogComponent::Application("ChartAdapter"), &error.to_string());
        panic!("{}", error);
    }

    fn publish(&self, event: ChartEvent) {
        if let Some(events) = &self.events {
            events.publish_chart_event(event);
        }
    }
}
