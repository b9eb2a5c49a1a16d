use crate::domain::errors::FeedError;
use crate::domain::market_data::FeedQuery;
use std::cell::RefCell;
use std::fmt::Debug;

/// Base trait for all domain events
pub trait DomainEvent: Debug + Clone {
    fn event_type(&self) -> &'static str;
}

/// Events emitted by the bar feed
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    BarsLoaded { query: FeedQuery, bar_count: usize },
    FeedFailed { query: FeedQuery, error: FeedError },
}

impl DomainEvent for FeedEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FeedEvent::BarsLoaded { .. } => "BarsLoaded",
            FeedEvent::FeedFailed { .. } => "FeedFailed",
        }
    }
}

/// Events emitted by the chart lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum ChartEvent {
    SessionStarted { session: u64, mount_id: String },
    SessionDisposed { session: u64 },
    DatasetReplaced { session: u64, bar_count: usize },
    StaleResultDiscarded { session: u64, generation: u64 },
}

impl DomainEvent for ChartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ChartEvent::SessionStarted { .. } => "SessionStarted",
            ChartEvent::SessionDisposed { .. } => "SessionDisposed",
            ChartEvent::DatasetReplaced { .. } => "DatasetReplaced",
            ChartEvent::StaleResultDiscarded { .. } => "StaleResultDiscarded",
        }
    }
}

/// Event dispatcher for publishing events
pub trait EventDispatcher {
    fn publish_feed_event(&self, event: FeedEvent);
    fn publish_chart_event(&self, event: ChartEvent);
}

type Handlers<T> = RefCell<Vec<Box<dyn Fn(&T)>>>;

/// Simple in-memory event dispatcher
#[derive(Default)]
pub struct InMemoryEventDispatcher {
    feed_handlers: Handlers<FeedEvent>,
    chart_handlers: Handlers<ChartEvent>,
}

impl InMemoryEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_to_feed_events<F>(&self, handler: F)
    where
        F: Fn(&FeedEvent) + 'static,
    {
        self.feed_handlers.borrow_mut().push(Box::new(handler));
    }

    pub fn subscribe_to_chart_events<F>(&self, handler: F)
    where
        F: Fn(&ChartEvent) + 'static,
    {
        self.chart_handlers.borrow_mut().push(Box::new(handler));
    }
}

impl EventDispatcher for InMemoryEventDispatcher {
    fn publish_feed_event(&self, event: FeedEvent) {
        for handler in self.feed_handlers.borrow().iter() {
            handler(&event);
        }
    }

    fn publish_chart_event(&self, event: ChartEvent) {
        for handler in self.chart_handlers.borrow().iter() {
            handler(&event);
        }
    }
}
