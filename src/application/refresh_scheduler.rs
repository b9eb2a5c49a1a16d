use crate::{
    application::{chart_adapter::{ChartEngineAdapter, ChartSession}, runtime::Runtime},
    domain::{
        chart::ChartEngine,
        events::{ChartEvent, EventDispatcher},
        logging::{LogComponent, get_logger},
        market_data::{BarFeed, FeedQuery},
    },
    log_debug,
};
use derive_more::Display;
use futures::future::{AbortHandle, abortable};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Polling state of one scheduler instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PollState {
    Idle,
    Scheduled,
    Fetching,
    Cancelled,
}

/// The pending polling task; replaced on every `start`.
struct PollCycle {
    generation: u64,
    abort: AbortHandle,
}

struct PollShared {
    state: Cell<PollState>,
    generation: Cell<u64>,
    cycle: RefCell<Option<PollCycle>>,
}

impl PollShared {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.get() == generation && self.state.get() != PollState::Cancelled
    }
}

/// Periodically fetches the latest bar for a query and appends it to the
/// chart, one fetch at a time, until cancelled.
pub struct RefreshScheduler<E: ChartEngine, F: BarFeed> {
    adapter: Rc<RefCell<ChartEngineAdapter<E>>>,
    feed: Rc<F>,
    runtime: Runtime,
    interval: Duration,
    skew_ms: u64,
    shared: Rc<PollShared>,
    events: Option<Rc<dyn EventDispatcher>>,
}

impl<E: ChartEngine, F: BarFeed> Clone for RefreshScheduler<E, F> {
    fn clone(&self) -> Self {
        Self {
            adapter: Rc::clone(&self.adapter),
            feed: Rc::clone(&self.feed),
            runtime: self.runtime.clone(),
            interval: self.interval,
            skew_ms: self.skew_ms,
            shared: Rc::clone(&self.shared),
            events: self.events.clone(),
        }
    }
}

impl<E: ChartEngine + 'static, F: BarFeed + 'static> RefreshScheduler<E, F> {
    pub fn new(
        adapter: Rc<RefCell<ChartEngineAdapter<E>>>,
        feed: Rc<F>,
        runtime: Runtime,
        interval: Duration,
        skew_ms: u64,
    ) -> Self {
        Self {
            adapter,
            feed,
            runtime,
            interval,
            skew_ms,
            shared: Rc::new(PollShared {
                state: Cell::new(PollState::Idle),
                generation: Cell::new(0),
                cycle: RefCell::new(None),
            }),
            events: None,
        }
    }

    pub fn with_events(mut self, events: Rc<dyn EventDispatcher>) -> Self {
        self.set_events(events);
        self
    }

    pub fn set_events(&mut self, events: Rc<dyn EventDispatcher>) {
        self.events = Some(events);
    }

    pub fn state(&self) -> PollState {
        self.shared.state.get()
    }

    /// Generation of the current cycle; bumped on every start and cancel.
    pub fn generation(&self) -> u64 {
        self.shared.generation.get()
    }

    /// Arm the polling loop for `query`. A cycle that is still pending is
    /// cancelled first, so at most one timer exists at any time.
    pub fn start(&self, session: ChartSession, query: FeedQuery) {
        if self.shared.cycle.borrow().is_some() {
            self.cancel();
        }

        let generation = self.shared.generation.get() + 1;
        self.shared.generation.set(generation);
        self.shared.state.set(PollState::Scheduled);

        get_logger().info(
            LogComponent::Application("RefreshScheduler"),
            &format!(
                "⏱️ Polling {} {} every {:?} (cycle {})",
                query.symbol,
                query.resolution,
                self.interval,
                generation
            ),
        );

        let task = Self::poll_loop(self.clone(), session, query, generation);
        let (task, abort) = abortable(task);
        *self.shared.cycle.borrow_mut() = Some(PollCycle { generation, abort });
        self.runtime.spawn(Box::pin(async move {
            let _ = task.await;
        }));
    }

    /// Stop polling; idempotent. A fetch already in flight is abandoned and
    /// its result, should it still arrive, is discarded.
    pub fn cancel(&self) {
        if let Some(cycle) = self.shared.cycle.borrow_mut().take() {
            cycle.abort.abort();
            log_debug!(
                LogComponent::Application("RefreshScheduler"),
                "🛑 Cancelled polling cycle {}",
                cycle.generation
            );
        }
        self.shared.generation.set(self.shared.generation.get() + 1);
        self.shared.state.set(PollState::Cancelled);
    }

    async fn poll_loop(self, session: ChartSession, query: FeedQuery, generation: u64) {
        loop {
            self.runtime.sleep(self.interval).await;
            if !self.shared.is_current(generation) {
                return;
            }
            if !self.adapter.borrow().is_live(&session) {
                log_debug!(
                    LogComponent::Application("RefreshScheduler"),
                    "Session #{} is gone, stopping cycle {}",
                    session.id(),
                    generation
                );
                self.finish(generation);
                return;
            }

            self.shared.state.set(PollState::Fetching);
            let bars = self.feed.fetch_bars(&query.poll_window()).await;

            if !self.shared.is_current(generation) || !self.adapter.borrow().is_live(&session) {
                log_debug!(
                    LogComponent::Application("RefreshScheduler"),
                    "Discarding stale poll result of cycle {}",
                    generation
                );
                if let Some(events) = &self.events {
                    events.publish_chart_event(ChartEvent::StaleResultDiscarded {
                        session: session.id(),
                        generation,
                    });
                }
                self.finish(generation);
                return;
            }

            if let Some(latest) = bars.last() {
                let bar = latest.shifted(self.skew_ms);
                self.adapter.borrow_mut().append_bar(&session, bar);
            }
            self.shared.state.set(PollState::Scheduled);
        }
    }

    /// Mark the cycle as cancelled from inside the loop, unless a newer cycle
    /// already took over.
    fn finish(&self, generation: u64) {
        let owns_cycle = self
            .shared
            .cycle
            .borrow()
            .as_ref()
            .is_some_and(|cycle| cycle.generation == generation);
        if owns_cycle {
            self.shared.cycle.borrow_mut().take();
            self.shared.state.set(PollState::Cancelled);
        }
    }
}
