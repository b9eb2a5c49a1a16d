use super::{Resolution, Symbol};
use crate::domain::logging::TimeProvider;
use serde::Serialize;
use std::rc::Rc;

pub const ONE_DAY_SECONDS: u64 = 86_400;

/// Feed query for one symbol/resolution over `[range_start, range_end]`
/// (seconds since the epoch, as the feed expects them).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedQuery {
    pub symbol: Symbol,
    #[serde(skip)]
    pub resolution: Resolution,
    #[serde(rename = "resolution")]
    pub resolution_code: &'static str,
    #[serde(rename = "from")]
    pub range_start: u64,
    #[serde(rename = "to")]
    pub range_end: u64,
}

impl FeedQuery {
    pub fn new(symbol: Symbol, resolution: Resolution, range_start: u64, range_end: u64) -> Self {
        Self {
            symbol,
            resolution,
            resolution_code: resolution.feed_code(),
            range_start,
            range_end,
        }
    }

    /// Anchor time the query was built at.
    pub fn anchor(&self) -> u64 {
        self.range_end
    }

    /// Same symbol/resolution/anchor, looking back `days` days.
    pub fn lookback_days(&self, days: u64) -> FeedQuery {
        self.lookback_secs(days.saturating_mul(ONE_DAY_SECONDS))
    }

    pub fn lookback_secs(&self, secs: u64) -> FeedQuery {
        FeedQuery::new(
            self.symbol.clone(),
            self.resolution,
            self.range_end.saturating_sub(secs),
            self.range_end,
        )
    }

    /// Exactly one resolution period ending at the anchor time.
    pub fn poll_window(&self) -> FeedQuery {
        self.lookback_secs(self.resolution.seconds())
    }

    pub fn query_params(&self) -> [(&'static str, String); 4] {
        [
            ("symbol", self.symbol.value().to_string()),
            ("resolution", self.resolution_code.to_string()),
            ("from", self.range_start.to_string()),
            ("to", self.range_end.to_string()),
        ]
    }
}

/// Builds feed queries from the current UI selection and the wall clock.
#[derive(Clone)]
pub struct QueryBuilder {
    clock: Rc<dyn TimeProvider>,
}

impl QueryBuilder {
    pub fn new(clock: Rc<dyn TimeProvider>) -> Self {
        Self { clock }
    }

    pub fn now_secs(&self) -> u64 {
        self.clock.current_timestamp() / 1000
    }

    /// `range_end = now`; the start is filled in per fetch via
    /// [`FeedQuery::lookback_days`] or [`FeedQuery::poll_window`].
    pub fn build(&self, symbol: &Symbol, resolution: Resolution) -> FeedQuery {
        let now = self.now_secs();
        FeedQuery::new(symbol.clone(), resolution, now, now)
    }
}
