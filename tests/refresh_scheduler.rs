#![cfg(feature = "headless")]

mod common;

use common::{
    HOUR_MS, ManualTimer, NOW_MS, NOW_SECS, POLL, ScriptedFeed, bar, hourly_bars, pool_runtime,
};
use futures::executor::LocalPool;
use kline_chart_wasm::application::{
    ChartEngineAdapter, ChartSession, PollState, RefreshScheduler,
};
use kline_chart_wasm::domain::events::{ChartEvent, InMemoryEventDispatcher};
use kline_chart_wasm::domain::market_data::{FeedQuery, Resolution, Symbol};
use kline_chart_wasm::infrastructure::{EngineCall, EngineJournal, HeadlessChartEngine};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

const SKEW_MS: u64 = 10_000;

struct Rig {
    pool: LocalPool,
    timer: ManualTimer,
    feed: ScriptedFeed,
    journal: EngineJournal,
    adapter: Rc<RefCell<ChartEngineAdapter<HeadlessChartEngine>>>,
    scheduler: RefreshScheduler<HeadlessChartEngine, ScriptedFeed>,
    session: ChartSession,
    events: Rc<RefCell<Vec<ChartEvent>>>,
}

impl Rig {
    fn new() -> Self {
        let pool = LocalPool::new();
        let timer = ManualTimer::default();
        let feed = ScriptedFeed::default();
        let journal = EngineJournal::new();
        let adapter = Rc::new(RefCell::new(ChartEngineAdapter::new(
            HeadlessChartEngine::factory(journal.clone()),
        )));
        let session = adapter.borrow_mut().initialize("chart").unwrap();
        adapter.borrow_mut().replace_dataset(&session, hourly_bars(24));

        let dispatcher = Rc::new(InMemoryEventDispatcher::new());
        let events = Rc::new(RefCell::new(Vec::new()));
        {
            let events = Rc::clone(&events);
            dispatcher.subscribe_to_chart_events(move |e| events.borrow_mut().push(e.clone()));
        }

        let scheduler = RefreshScheduler::new(
            Rc::clone(&adapter),
            Rc::new(feed.clone()),
            pool_runtime(&pool, &timer),
            POLL,
            SKEW_MS,
        )
        .with_events(dispatcher);

        Self { pool, timer, feed, journal, adapter, scheduler, session, events }
    }

    fn query() -> FeedQuery {
        FeedQuery::new(Symbol::from("BTC-PERP"), Resolution::OneHour, NOW_SECS, NOW_SECS)
    }

    fn tick(&mut self, by: Duration) {
        self.timer.advance(by);
        self.pool.run_until_stalled();
    }

    fn updates(&self) -> usize {
        self.journal.count(|c| matches!(c, EngineCall::UpdateData { .. }))
    }
}

#[test]
fn polls_one_period_and_appends_the_latest_bar_with_skew() {
    let mut rig = Rig::new();
    rig.feed.push_response(vec![bar(NOW_MS - HOUR_MS, 1.0), bar(NOW_MS, 2.0)]);
    rig.scheduler.start(rig.session.clone(), Rig::query());
    rig.pool.run_until_stalled();
    assert_eq!(rig.scheduler.state(), PollState::Scheduled);
    assert_eq!(rig.feed.query_count(), 0);

    rig.tick(POLL);

    let queries = rig.feed.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].range_start, NOW_SECS - 3600);
    assert_eq!(queries[0].range_end, NOW_SECS);
    assert_eq!(queries[0].resolution_code, "60");

    let tail = rig.adapter.borrow().tail(&rig.session).unwrap().value();
    assert_eq!(tail, NOW_MS + SKEW_MS);
    assert_eq!(rig.updates(), 1);
    assert_eq!(rig.scheduler.state(), PollState::Scheduled);
    assert_eq!(rig.timer.pending(), 1);
}

#[test]
fn keeps_polling_after_empty_or_stale_results() {
    let mut rig = Rig::new();
    rig.scheduler.start(rig.session.clone(), Rig::query());
    rig.pool.run_until_stalled();

    rig.tick(POLL); // empty
    rig.feed.push_response(vec![bar(NOW_MS - 5 * HOUR_MS, 1.0)]); // older than tail after skew
    rig.tick(POLL);
    rig.tick(POLL);

    assert_eq!(rig.feed.query_count(), 3);
    assert_eq!(rig.updates(), 0);
    assert_eq!(rig.scheduler.state(), PollState::Scheduled);
}

#[test]
fn never_overlaps_fetches() {
    let mut rig = Rig::new();
    rig.feed.hold(true);
    rig.scheduler.start(rig.session.clone(), Rig::query());
    rig.pool.run_until_stalled();

    rig.tick(POLL);
    assert_eq!(rig.scheduler.state(), PollState::Fetching);
    rig.tick(POLL);
    rig.tick(POLL);
    assert_eq!(rig.feed.query_count(), 1);
    assert_eq!(rig.timer.pending(), 0);

    rig.feed.hold(false);
    rig.feed.release_all();
    rig.pool.run_until_stalled();
    assert_eq!(rig.scheduler.state(), PollState::Scheduled);

    rig.tick(POLL);
    assert_eq!(rig.feed.query_count(), 2);
    assert_eq!(rig.feed.max_in_flight(), 1);
}

#[test]
fn cancel_stops_the_loop_and_is_idempotent() {
    let mut rig = Rig::new();
    rig.scheduler.start(rig.session.clone(), Rig::query());
    rig.pool.run_until_stalled();

    rig.scheduler.cancel();
    rig.scheduler.cancel();
    rig.pool.run_until_stalled();
    assert_eq!(rig.scheduler.state(), PollState::Cancelled);
    assert_eq!(rig.timer.pending(), 0);

    rig.tick(POLL * 3);
    assert_eq!(rig.feed.query_count(), 0);
}

#[test]
fn restart_leaves_a_single_timer() {
    let mut rig = Rig::new();
    rig.scheduler.start(rig.session.clone(), Rig::query());
    rig.scheduler.start(rig.session.clone(), Rig::query());
    rig.scheduler.start(rig.session.clone(), Rig::query());
    rig.pool.run_until_stalled();
    assert_eq!(rig.timer.pending(), 1);

    rig.tick(POLL);
    assert_eq!(rig.feed.query_count(), 1);
}

#[test]
fn result_arriving_after_cancel_is_discarded() {
    let mut rig = Rig::new();
    rig.feed.hold(true);
    rig.feed.push_response(vec![bar(NOW_MS, 2.0)]);
    rig.scheduler.start(rig.session.clone(), Rig::query());
    rig.pool.run_until_stalled();
    rig.tick(POLL);
    assert_eq!(rig.feed.in_flight(), 1);

    let generation = rig.scheduler.generation();
    rig.scheduler.cancel();
    assert!(rig.scheduler.generation() > generation);
    rig.feed.release_all();
    rig.pool.run_until_stalled();

    assert_eq!(rig.updates(), 0);
    assert_eq!(rig.feed.in_flight(), 0);
    assert_eq!(rig.adapter.borrow().dataset(&rig.session).len(), 24);
}

#[test]
fn stops_quietly_when_the_session_is_disposed() {
    let mut rig = Rig::new();
    rig.scheduler.start(rig.session.clone(), Rig::query());
    rig.pool.run_until_stalled();

    let session = rig.session.clone();
    rig.adapter.borrow_mut().dispose(&session);
    rig.tick(POLL);

    assert_eq!(rig.feed.query_count(), 0);
    assert_eq!(rig.scheduler.state(), PollState::Cancelled);
    assert_eq!(rig.timer.pending(), 0);
}

#[test]
fn dispose_during_fetch_discards_the_result() {
    let mut rig = Rig::new();
    rig.feed.hold(true);
    rig.feed.push_response(vec![bar(NOW_MS, 2.0)]);
    rig.scheduler.start(rig.session.clone(), Rig::query());
    rig.pool.run_until_stalled();
    rig.tick(POLL);

    let session = rig.session.clone();
    rig.adapter.borrow_mut().dispose(&session);
    rig.feed.release_all();
    rig.pool.run_until_stalled();

    assert_eq!(rig.updates(), 0);
    assert!(rig.events.borrow().iter().any(|e| matches!(
        e,
        ChartEvent::StaleResultDiscarded { session: id, .. } if *id == rig.session.id()
    )));
    assert_eq!(rig.scheduler.state(), PollState::Cancelled);
}

#[test]
fn dispatcher_set_in_place_receives_discards() {
    let mut rig = Rig::new();
    let replacement = Rc::new(InMemoryEventDispatcher::new());
    let received = Rc::new(RefCell::new(Vec::new()));
    {
        let received = Rc::clone(&received);
        replacement.subscribe_to_chart_events(move |e| received.borrow_mut().push(e.clone()));
    }
    rig.scheduler.set_events(replacement);

    rig.feed.hold(true);
    rig.feed.push_response(vec![bar(NOW_MS, 2.0)]);
    rig.scheduler.start(rig.session.clone(), Rig::query());
    rig.pool.run_until_stalled();
    rig.tick(POLL);

    let session = rig.session.clone();
    rig.adapter.borrow_mut().dispose(&session);
    rig.feed.release_all();
    rig.pool.run_until_stalled();

    assert!(rig.events.borrow().is_empty());
    let discards = received
        .borrow()
        .iter()
        .filter(|e| matches!(e, ChartEvent::StaleResultDiscarded { .. }))
        .count();
    assert_eq!(discards, 1);
}
