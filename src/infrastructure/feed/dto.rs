use crate::domain::{
    errors::{FeedError, FeedResult},
    market_data::{Bar, OHLCV, Price, Timestamp, Volume, normalize_bars},
};
use serde::Deserialize;

/// Numeric payload field; feeds send either JSON numbers or decimal strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FeedNumber {
    Number(f64),
    Text(String),
}

impl FeedNumber {
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            FeedNumber::Number(n) => *n,
            FeedNumber::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Whole seconds since the epoch.
    pub fn as_epoch_secs(&self) -> Option<u64> {
        let value = self.as_f64()?;
        (value >= 0.0 && value.fract() == 0.0).then_some(value as u64)
    }
}

/// DTO for the `/history` response: index-aligned parallel arrays.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryPayload {
    #[serde(default)]
    pub s: Option<String>,
    #[serde(default)]
    pub errmsg: Option<String>,
    #[serde(default)]
    pub t: Vec<FeedNumber>,
    #[serde(default)]
    pub o: Vec<FeedNumber>,
    #[serde(default)]
    pub h: Vec<FeedNumber>,
    #[serde(default)]
    pub l: Vec<FeedNumber>,
    #[serde(default)]
    pub c: Vec<FeedNumber>,
    #[serde(default)]
    pub v: Vec<FeedNumber>,
}

/// Bars that survived parsing, plus how many were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedHistory {
    pub bars: Vec<Bar>,
    pub dropped: usize,
}

impl ParsedHistory {
    pub fn partial_error(&self) -> Option<FeedError> {
        (self.dropped > 0)
            .then(|| FeedError::PartialParse { dropped: self.dropped, kept: self.bars.len() })
    }
}

impl HistoryPayload {
    pub fn into_bars(self) -> FeedResult<ParsedHistory> {
        match self.s.as_deref() {
            Some("no_data") => return Ok(ParsedHistory::default()),
            Some("error") => {
                return Err(FeedError::FeedStatus(
                    self.errmsg.unwrap_or_else(|| "unknown feed error".to_string()),
                ));
            }
            _ => {}
        }

        let len = self.t.len();
        let lengths = [self.o.len(), self.h.len(), self.l.len(), self.c.len(), self.v.len()];
        if lengths.iter().any(|&n| n != len) {
            return Err(FeedError::MalformedPayload(format!(
                "array lengths disagree: t={} o={} h={} l={} c={} v={}",
                len, lengths[0], lengths[1], lengths[2], lengths[3], lengths[4]
            )));
        }

        let mut bars = Vec::with_capacity(len);
        for i in 0..len {
            if let Some(bar) = self.bar_at(i) {
                bars.push(bar);
            }
        }
        let dropped = len - bars.len();

        if len > 0 && bars.is_empty() {
            return Err(FeedError::MalformedPayload(format!(
                "none of {} bars could be parsed",
                len
            )));
        }

        Ok(ParsedHistory { bars: normalize_bars(bars), dropped })
    }

    fn bar_at(&self, i: usize) -> Option<Bar> {
        let open_time = Timestamp::from_secs(self.t[i].as_epoch_secs()?);
        let ohlcv = OHLCV::new(
            Price::from(self.o[i].as_f64()?),
            Price::from(self.h[i].as_f64()?),
            Price::from(self.l[i].as_f64()?),
            Price::from(self.c[i].as_f64()?),
            Volume::from(self.v[i].as_f64()?),
        );
        let bar = Bar::new(open_time, ohlcv);
        bar.is_well_formed().then_some(bar)
    }
}

/// Parse a raw `/history` body.
pub fn parse_history(body: &str) -> FeedResult<ParsedHistory> {
    let payload: HistoryPayload = serde_json::from_str(body)
        .map_err(|e| FeedError::MalformedPayload(format!("invalid JSON: {}", e)))?;
    payload.into_bars()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_and_strings_both_parse() {
        assert_eq!(FeedNumber::Text(" 42.5 ".into()).as_f64(), Some(42.5));
        assert_eq!(FeedNumber::Number(7.0).as_f64(), Some(7.0));
        assert_eq!(FeedNumber::Text("abc".into()).as_f64(), None);
        assert_eq!(FeedNumber::Text("NaN".into()).as_f64(), None);
    }

    #[test]
    fn fractional_or_negative_times_are_rejected() {
        assert_eq!(FeedNumber::Number(1.5).as_epoch_secs(), None);
        assert_eq!(FeedNumber::Number(-60.0).as_epoch_secs(), None);
        assert_eq!(FeedNumber::Text("1700000000".into()).as_epoch_secs(), Some(1_700_000_000));
    }

    #[test]
    fn missing_arrays_count_as_empty() {
        let parsed = parse_history("{}").unwrap();
        assert!(parsed.bars.is_empty());
        assert_eq!(parsed.partial_error(), None);
    }
}
