//! Chart-data feed client.

pub mod dto;
pub mod http_feed;

pub use dto::{FeedNumber, HistoryPayload, ParsedHistory, parse_history};
pub use http_feed::HttpBarFeed;
