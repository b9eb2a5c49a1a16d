use crate::domain::market_data::{Bar, FeedQuery};

/// Source of historical bars.
///
/// Fail-soft: implementations report transport and payload failures to their
/// own observability collaborators and return an empty batch. The returned
/// bars are ordered by ascending open time without duplicates.
#[allow(async_fn_in_trait)]
pub trait BarFeed {
    async fn fetch_bars(&self, query: &FeedQuery) -> Vec<Bar>;
}
