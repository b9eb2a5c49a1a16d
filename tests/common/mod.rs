#![allow(dead_code)]

use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use kline_chart_wasm::application::{
    ChartConfig, ChartEngineAdapter, ChartLifecycleController, Runtime, Spawner, Timer,
};
use kline_chart_wasm::domain::chart::ThemeTokens;
use kline_chart_wasm::domain::events::{ChartEvent, FeedEvent, InMemoryEventDispatcher};
use kline_chart_wasm::domain::logging::TimeProvider;
use kline_chart_wasm::domain::market_data::{
    Bar, BarFeed, FeedQuery, OHLCV, Price, Timestamp, Volume,
};
use kline_chart_wasm::infrastructure::{EngineJournal, HeadlessChartEngine};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// 2023-11-14T22:13:20Z
pub const NOW_SECS: u64 = 1_700_000_000;
pub const NOW_MS: u64 = NOW_SECS * 1000;
pub const HOUR_MS: u64 = 3_600_000;
pub const POLL: Duration = Duration::from_secs(10);

pub fn bar(open_time_ms: u64, close: f64) -> Bar {
    Bar::new(
        Timestamp::from_millis(open_time_ms),
        OHLCV::new(
            Price::from(close),
            Price::from(close + 1.0),
            Price::from(close - 1.0),
            Price::from(close),
            Volume::from(1.0),
        ),
    )
}

/// `count` hourly bars ending one hour before `NOW_MS`.
pub fn hourly_bars(count: u64) -> Vec<Bar> {
    (0..count)
        .map(|i| bar(NOW_MS - (count - i) * HOUR_MS, 100.0 + i as f64))
        .collect()
}

pub fn theme() -> ThemeTokens {
    ThemeTokens::new("#123456")
}

pub struct FixedClock(pub u64);

impl TimeProvider for FixedClock {
    fn current_timestamp(&self) -> u64 {
        self.0
    }

    fn format_timestamp(&self, timestamp: u64) -> String {
        timestamp.to_string()
    }
}

pub struct PoolSpawner(pub LocalSpawner);

impl Spawner for PoolSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.0.spawn_local(task).expect("pool is alive");
    }
}

#[derive(Default)]
struct TimerState {
    now: Duration,
    pending: Vec<(Duration, oneshot::Sender<()>)>,
}

/// Timer whose clock only moves when told to.
#[derive(Clone, Default)]
pub struct ManualTimer {
    state: Rc<RefCell<TimerState>>,
}

impl ManualTimer {
    /// Move the clock forward and fire every timer that became due.
    pub fn advance(&self, by: Duration) {
        let due = {
            let mut state = self.state.borrow_mut();
            state.now += by;
            let now = state.now;
            let (due, waiting): (Vec<_>, Vec<_>) =
                state.pending.drain(..).partition(|(deadline, _)| *deadline <= now);
            state.pending = waiting;
            due
        };
        for (_, tx) in due {
            let _ = tx.send(());
        }
    }

    /// Timers still armed by a live task.
    pub fn pending(&self) -> usize {
        self.state.borrow().pending.iter().filter(|(_, tx)| !tx.is_canceled()).count()
    }
}

impl Timer for ManualTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.state.borrow_mut();
            let deadline = state.now + duration;
            state.pending.push((deadline, tx));
        }
        Box::pin(async move {
            let _ = rx.await;
        })
    }
}

type Responder = Box<dyn Fn(&FeedQuery) -> Vec<Bar>>;

struct FeedState {
    queries: Vec<FeedQuery>,
    responses: VecDeque<Vec<Bar>>,
    responder: Responder,
    hold: bool,
    gates: Vec<oneshot::Sender<()>>,
    in_flight: usize,
    max_in_flight: usize,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            queries: Vec::new(),
            responses: VecDeque::new(),
            responder: Box::new(|_| Vec::new()),
            hold: false,
            gates: Vec::new(),
            in_flight: 0,
            max_in_flight: 0,
        }
    }
}

struct InFlight(Rc<RefCell<FeedState>>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.borrow_mut().in_flight -= 1;
    }
}

/// `BarFeed` answering from a script; can hold requests until released.
#[derive(Clone, Default)]
pub struct ScriptedFeed {
    state: Rc<RefCell<FeedState>>,
}

impl ScriptedFeed {
    /// Answer of the next completed request.
    pub fn push_response(&self, bars: Vec<Bar>) {
        self.state.borrow_mut().responses.push_back(bars);
    }

    /// Answer used once the scripted responses ran out.
    pub fn respond_with(&self, responder: impl Fn(&FeedQuery) -> Vec<Bar> + 'static) {
        self.state.borrow_mut().responder = Box::new(responder);
    }

    pub fn hold(&self, hold: bool) {
        self.state.borrow_mut().hold = hold;
    }

    pub fn release_all(&self) {
        let gates: Vec<_> = self.state.borrow_mut().gates.drain(..).collect();
        for gate in gates {
            let _ = gate.send(());
        }
    }

    pub fn queries(&self) -> Vec<FeedQuery> {
        self.state.borrow().queries.clone()
    }

    pub fn query_count(&self) -> usize {
        self.state.borrow().queries.len()
    }

    pub fn in_flight(&self) -> usize {
        self.state.borrow().in_flight
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.borrow().max_in_flight
    }
}

impl BarFeed for ScriptedFeed {
    async fn fetch_bars(&self, query: &FeedQuery) -> Vec<Bar> {
        let gate = {
            let mut state = self.state.borrow_mut();
            state.queries.push(query.clone());
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            if state.hold {
                let (tx, rx) = oneshot::channel();
                state.gates.push(tx);
                Some(rx)
            } else {
                None
            }
        };
        let _in_flight = InFlight(Rc::clone(&self.state));

        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let mut state = self.state.borrow_mut();
        match state.responses.pop_front() {
            Some(bars) => bars,
            None => (state.responder)(query),
        }
    }
}

pub fn pool_runtime(pool: &LocalPool, timer: &ManualTimer) -> Runtime {
    Runtime::new(Rc::new(PoolSpawner(pool.spawner())), Rc::new(timer.clone()))
}

pub type TestController = ChartLifecycleController<HeadlessChartEngine, ScriptedFeed>;

/// Controller wired to a headless engine, a scripted feed and a manual timer.
pub struct Harness {
    pub controller: TestController,
    pub pool: LocalPool,
    pub timer: ManualTimer,
    pub feed: ScriptedFeed,
    pub journal: EngineJournal,
    pub chart_events: Rc<RefCell<Vec<ChartEvent>>>,
    pub feed_events: Rc<RefCell<Vec<FeedEvent>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ChartConfig::default())
    }

    pub fn with_config(config: ChartConfig) -> Self {
        let pool = LocalPool::new();
        let timer = ManualTimer::default();
        let feed = ScriptedFeed::default();
        let journal = EngineJournal::new();

        let events = Rc::new(InMemoryEventDispatcher::new());
        let chart_events = Rc::new(RefCell::new(Vec::new()));
        let feed_events = Rc::new(RefCell::new(Vec::new()));
        {
            let chart_events = Rc::clone(&chart_events);
            events.subscribe_to_chart_events(move |e| chart_events.borrow_mut().push(e.clone()));
            let feed_events = Rc::clone(&feed_events);
            events.subscribe_to_feed_events(move |e| feed_events.borrow_mut().push(e.clone()));
        }

        let adapter = ChartEngineAdapter::new(HeadlessChartEngine::factory(journal.clone()));
        let controller = ChartLifecycleController::new(
            config,
            adapter,
            feed.clone(),
            pool_runtime(&pool, &timer),
            Rc::new(FixedClock(NOW_MS)),
        )
        .with_events(events);

        Self { controller, pool, timer, feed, journal, chart_events, feed_events }
    }

    pub fn settle(&mut self) {
        self.pool.run_until_stalled();
    }

    pub fn tick(&mut self, by: Duration) {
        self.timer.advance(by);
        self.settle();
    }

    pub fn stale_discards(&self) -> usize {
        self.chart_events
            .borrow()
            .iter()
            .filter(|e| matches!(e, ChartEvent::StaleResultDiscarded { .. }))
            .count()
    }
}
