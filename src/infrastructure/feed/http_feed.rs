use super::dto::{ParsedHistory, parse_history};
use crate::domain::{
    errors::{FeedError, FeedResult},
    events::{EventDispatcher, FeedEvent},
    logging::{LogComponent, LogLevel, log_fields},
    market_data::{Bar, BarFeed, FeedQuery},
};
use crate::{log_error, log_warn};
use gloo_net::http::Request;
use std::rc::Rc;

/// `BarFeed` over the chart-data HTTP endpoint (`GET {base}/history`).
#[derive(Clone)]
pub struct HttpBarFeed {
    base_url: String,
    events: Option<Rc<dyn EventDispatcher>>,
}

impl HttpBarFeed {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, events: None }
    }

    pub fn with_events(mut self, events: Rc<dyn EventDispatcher>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn history_url(&self) -> String {
        format!("{}/history", self.base_url)
    }

    /// Fallible fetch; `fetch_bars` is the fail-soft wrapper around it.
    pub async fn fetch_history(&self, query: &FeedQuery) -> FeedResult<ParsedHistory> {
        let body = self.fetch_body(query).await?;
        parse_history(&body)
    }

    async fn fetch_body(&self, query: &FeedQuery) -> FeedResult<String> {
        let url = self.history_url();
        log_fields(
            LogLevel::Debug,
            LogComponent::Infrastructure("HttpBarFeed"),
            &format!("📡 GET {}", url),
            query.query_params(),
        );

        let response = Request::get(&url)
            .query(query.query_params())
            .send()
            .await
            .map_err(|e| FeedError::Transport(format!("request failed: {}", e)))?;

        if !response.ok() {
            return Err(FeedError::Transport(format!(
                "HTTP {} {}",
                response.status(),
                response.status_text()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| FeedError::Transport(format!("cannot read body: {}", e)))
    }

    /// Turn the outcome of one fetch into the fail-soft result, reporting
    /// failures and partial drops.
    pub fn resolve(&self, query: &FeedQuery, outcome: FeedResult<ParsedHistory>) -> Vec<Bar> {
        match outcome {
            Ok(parsed) => {
                if let Some(partial) = parsed.partial_error() {
                    log_warn!(
                        LogComponent::Infrastructure("HttpBarFeed"),
                        "⚠️ {} for {} {}",
                        partial,
                        query.symbol,
                        query.resolution
                    );
                    self.publish(FeedEvent::FeedFailed { query: query.clone(), error: partial });
                }
                self.publish(FeedEvent::BarsLoaded {
                    query: query.clone(),
                    bar_count: parsed.bars.len(),
                });
                parsed.bars
            }
            Err(error) => {
                log_error!(
                    LogComponent::Infrastructure("HttpBarFeed"),
                    "❌ Feed request for {} {} failed: {}",
                    query.symbol,
                    query.resolution,
                    error
                );
                self.publish(FeedEvent::FeedFailed { query: query.clone(), error });
                Vec::new()
            }
        }
    }

    fn publish(&self, event: FeedEvent) {
        if let Some(events) = &self.events {
            events.publish_feed_event(event);
        }
    }
}

impl BarFeed for HttpBarFeed {
    async fn fetch_bars(&self, query: &FeedQuery) -> Vec<Bar> {
        let outcome = self.fetch_history(query).await;
        self.resolve(query, outcome)
    }
}
