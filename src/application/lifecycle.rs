use crate::{
    application::{
        chart_adapter::{ChartEngineAdapter, ChartSession},
        config::ChartConfig,
        indicator_registry::{IndicatorRegistry, ToggleOutcome},
        refresh_scheduler::{PollState, RefreshScheduler},
        runtime::Runtime,
    },
    domain::{
        chart::{ChartEngine, ChartStyles, IndicatorKind, PanePlacement, ThemeTokens},
        errors::AppError,
        events::{ChartEvent, EventDispatcher},
        logging::{LogComponent, TimeProvider, get_logger},
        market_data::{BarFeed, FeedQuery, QueryBuilder, Resolution, Symbol, Timestamp},
    },
    log_debug,
};
use futures::future::{AbortHandle, abortable};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Progress of the one-shot extended history load of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadMore {
    Ready,
    Loading,
    Exhausted,
}

/// Drives the chart panel through mount, input changes, resizes and unmount.
///
/// Every asynchronous result is tagged with the query generation it was
/// started under and dropped if the generation moved on or the session died
/// while it was in flight.
pub struct ChartLifecycleController<E: ChartEngine + 'static, F: BarFeed + 'static> {
    config: ChartConfig,
    adapter: Rc<RefCell<ChartEngineAdapter<E>>>,
    feed: Rc<F>,
    runtime: Runtime,
    queries: QueryBuilder,
    scheduler: RefreshScheduler<E, F>,
    registry: IndicatorRegistry,
    session: Option<ChartSession>,
    symbol: Option<Symbol>,
    resolution: Resolution,
    query: Option<FeedQuery>,
    query_generation: Rc<Cell<u64>>,
    last_width: Option<f64>,
    pending_resize: Option<AbortHandle>,
    events: Option<Rc<dyn EventDispatcher>>,
}

impl<E: ChartEngine + 'static, F: BarFeed + 'static> ChartLifecycleController<E, F> {
    pub fn new(
        config: ChartConfig,
        adapter: ChartEngineAdapter<E>,
        feed: F,
        runtime: Runtime,
        clock: Rc<dyn TimeProvider>,
    ) -> Self {
        let adapter = Rc::new(RefCell::new(adapter));
        let feed = Rc::new(feed);
        let scheduler = RefreshScheduler::new(
            Rc::clone(&adapter),
            Rc::clone(&feed),
            runtime.clone(),
            config.poll_interval(),
            config.poll_skew_ms,
        );
        let resolution = config.default_resolution;

        Self {
            config,
            adapter,
            feed,
            runtime,
            queries: QueryBuilder::new(clock),
            scheduler,
            registry: IndicatorRegistry::new(),
            session: None,
            symbol: None,
            resolution,
            query: None,
            query_generation: Rc::new(Cell::new(0)),
            last_width: None,
            pending_resize: None,
            events: None,
        }
    }

    pub fn with_events(mut self, events: Rc<dyn EventDispatcher>) -> Self {
        self.adapter.borrow_mut().set_events(Rc::clone(&events));
        self.scheduler.set_events(Rc::clone(&events));
        self.events = Some(events);
        self
    }

    /// Create the engine, style it, add the default sub indicator and, when a
    /// market is already selected, load its data.
    pub fn mount(&mut self, theme: &ThemeTokens) -> Result<ChartSession, AppError> {
        if self.session.is_some() {
            self.unmount();
        }

        let session = self.adapter.borrow_mut().initialize(&self.config.mount_id)?;
        self.adapter
            .borrow_mut()
            .apply_styles(&session, &ChartStyles::from_theme(theme));

        self.registry.clear();
        if let Some(kind) = self.config.default_sub_indicator {
            self.registry.set_indicator(
                &mut self.adapter.borrow_mut(),
                &session,
                kind,
                PanePlacement::Sub,
                true,
            );
        }

        self.session = Some(session.clone());
        self.last_width = None;
        if self.query.is_some() {
            self.reload();
        }
        Ok(session)
    }

    /// Stop every pending task and dispose the engine. Safe to call when not
    /// mounted.
    pub fn unmount(&mut self) {
        self.scheduler.cancel();
        if let Some(resize) = self.pending_resize.take() {
            resize.abort();
        }
        self.bump_generation();

        if let Some(session) = self.session.take() {
            self.registry.clear();
            self.adapter.borrow_mut().dispose(&session);
            get_logger().info(
                LogComponent::Application("ChartLifecycle"),
                &format!("👋 Unmounted chart session #{}", session.id()),
            );
        }
    }

    /// Select a market. Re-queries only when the symbol actually changed.
    pub fn set_market(&mut self, symbol: Option<Symbol>) {
        if self.symbol == symbol {
            return;
        }
        self.symbol = symbol;
        self.inputs_changed();
    }

    /// Select a resolution. Re-queries only when it actually changed.
    pub fn set_resolution(&mut self, resolution: Resolution) {
        if self.resolution == resolution {
            return;
        }
        self.resolution = resolution;
        self.inputs_changed();
    }

    fn inputs_changed(&mut self) {
        let Some(symbol) = self.symbol.as_ref() else {
            log_debug!(
                LogComponent::Application("ChartLifecycle"),
                "No market selected, keeping the current query"
            );
            return;
        };

        let query = self.queries.build(symbol, self.resolution);
        get_logger().info(
            LogComponent::Application("ChartLifecycle"),
            &format!("🔁 Query changed to {} {}", query.symbol, query.resolution),
        );
        self.query = Some(query);
        if self.session.is_some() {
            self.reload();
        }
    }

    /// Replace the dataset for the current query and restart polling once it
    /// has arrived.
    fn reload(&mut self) {
        let (Some(session), Some(query)) = (self.session.clone(), self.query.clone()) else {
            return;
        };

        let generation = self.bump_generation();
        self.scheduler.cancel();
        self.register_load_more(&session, &query, generation);

        let adapter = Rc::downgrade(&self.adapter);
        let feed = Rc::clone(&self.feed);
        let scheduler = self.scheduler.clone();
        let current = Rc::clone(&self.query_generation);
        let events = self.events.clone();
        let history = query.lookback_days(self.config.initial_history_days);

        self.runtime.spawn(Box::pin(async move {
            let bars = feed.fetch_bars(&history).await;

            let Some(adapter) = live_adapter(&adapter, &session, &current, generation) else {
                log_debug!(
                    LogComponent::Application("ChartLifecycle"),
                    "Discarding stale history of generation {}",
                    generation
                );
                if let Some(events) = events {
                    events.publish_chart_event(ChartEvent::StaleResultDiscarded {
                        session: session.id(),
                        generation,
                    });
                }
                return;
            };

            let count = adapter.borrow_mut().replace_dataset(&session, bars);
            get_logger().info(
                LogComponent::Application("ChartLifecycle"),
                &format!("📊 Loaded {} bars for {} {}", count, query.symbol, query.resolution),
            );
            scheduler.start(session, query);
        }));
    }

    /// The engine asks for older bars when scrolled to the left edge; the
    /// extended window is fetched once per query.
    fn register_load_more(&self, session: &ChartSession, query: &FeedQuery, generation: u64) {
        let state = Rc::new(Cell::new(LoadMore::Ready));
        let adapter = Rc::downgrade(&self.adapter);
        let feed = Rc::clone(&self.feed);
        let runtime = self.runtime.clone();
        let current = Rc::clone(&self.query_generation);
        let window = query.lookback_days(self.config.extended_history_days);
        let session_for_task = session.clone();

        let callback = move |oldest: Option<Timestamp>| {
            if current.get() != generation || state.get() != LoadMore::Ready {
                return;
            }
            state.set(LoadMore::Loading);
            log_debug!(
                LogComponent::Application("ChartLifecycle"),
                "⏪ Loading extended history before {:?}",
                oldest.map(|t| t.value())
            );

            let adapter = adapter.clone();
            let feed = Rc::clone(&feed);
            let current = Rc::clone(&current);
            let state = Rc::clone(&state);
            let window = window.clone();
            let session = session_for_task.clone();
            runtime.spawn(Box::pin(async move {
                let bars = feed.fetch_bars(&window).await;
                let Some(adapter) = live_adapter(&adapter, &session, &current, generation) else {
                    state.set(LoadMore::Ready);
                    return;
                };
                let count = adapter.borrow_mut().merge_history(&session, bars);
                state.set(LoadMore::Exhausted);
                get_logger().info(
                    LogComponent::Application("ChartLifecycle"),
                    &format!("📚 Extended history merged, {} bars resident", count),
                );
            }));
        };

        self.adapter
            .borrow_mut()
            .set_load_more(session, Box::new(callback));
    }

    /// Report the viewport width. An unchanged width is ignored; otherwise a
    /// single resize is deferred to the next tick. Returns whether a resize
    /// was scheduled.
    pub fn on_viewport_width(&mut self, width: f64) -> bool {
        if self.last_width == Some(width) {
            return false;
        }
        self.last_width = Some(width);

        let Some(session) = self.session.clone() else {
            return false;
        };
        if let Some(previous) = self.pending_resize.take() {
            previous.abort();
        }

        let adapter = Rc::downgrade(&self.adapter);
        let delay = self.runtime.sleep(Duration::ZERO);
        let (task, handle) = abortable(async move {
            delay.await;
            if let Some(adapter) = adapter.upgrade() {
                if adapter.borrow().is_live(&session) {
                    adapter.borrow_mut().resize(&session);
                }
            }
        });
        self.pending_resize = Some(handle);
        self.runtime.spawn(Box::pin(async move {
            let _ = task.await;
        }));
        true
    }

    /// Toggle an indicator. Without a mounted engine nothing happens.
    pub fn set_indicator(
        &mut self,
        kind: IndicatorKind,
        placement: PanePlacement,
        enabled: bool,
    ) -> ToggleOutcome {
        let Some(session) = self.session.as_ref() else {
            get_logger().warn(
                LogComponent::Application("ChartLifecycle"),
                &format!("Indicator {} toggled while unmounted", kind),
            );
            return ToggleOutcome::Unchanged;
        };
        self.registry.set_indicator(
            &mut self.adapter.borrow_mut(),
            session,
            kind,
            placement,
            enabled,
        )
    }

    pub fn indicators(&self) -> &IndicatorRegistry {
        &self.registry
    }

    pub fn session(&self) -> Option<&ChartSession> {
        self.session.as_ref()
    }

    pub fn query(&self) -> Option<&FeedQuery> {
        self.query.as_ref()
    }

    pub fn symbol(&self) -> Option<&Symbol> {
        self.symbol.as_ref()
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn poll_state(&self) -> PollState {
        self.scheduler.state()
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn adapter(&self) -> Rc<RefCell<ChartEngineAdapter<E>>> {
        Rc::clone(&self.adapter)
    }

    fn bump_generation(&self) -> u64 {
        let next = self.query_generation.get() + 1;
        self.query_generation.set(next);
        next
    }
}

impl<E: ChartEngine + 'static, F: BarFeed + 'static> Drop for ChartLifecycleController<E, F> {
    fn drop(&mut self) {
        if self.session.is_some() {
            self.unmount();
        }
    }
}

fn live_adapter<E: ChartEngine>(
    adapter: &Weak<RefCell<ChartEngineAdapter<E>>>,
    session: &ChartSession,
    current: &Cell<u64>,
    generation: u64,
) -> Option<Rc<RefCell<ChartEngineAdapter<E>>>> {
    if current.get() != generation {
        return None;
    }
    let adapter = adapter.upgrade()?;
    let live = adapter.borrow().is_live(session);
    live.then_some(adapter)
}
