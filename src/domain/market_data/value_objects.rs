use derive_more::{Constructor, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString, IntoEnumIterator};

/// Value Object - price as delivered by the feed
#[derive(Debug, Clone, Copy, PartialEq, From, Into, Deref, Constructor, Serialize, Deserialize)]
pub struct Price(f64);

impl Price {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, From, Into, Deref, Constructor, Serialize, Deserialize)]
pub struct Volume(f64);

impl Volume {
    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Value Object - bar open time in milliseconds since the epoch
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    From,
    Into,
    Deref,
    Constructor,
    Serialize,
    Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn from_millis(value: u64) -> Self {
        Self(value)
    }

    /// Feed payloads carry whole seconds.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    pub fn shifted_by(&self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }
}

/// Value Object - OHLCV tuple of one bar
#[derive(Debug, Clone, Copy, PartialEq, Constructor, Serialize, Deserialize)]
pub struct OHLCV {
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Volume,
}

impl OHLCV {
    /// `low <= min(open, close)`, `high >= max(open, close)`, finite values and
    /// non-negative volume.
    pub fn is_valid(&self) -> bool {
        let finite = [
            self.open.value(),
            self.high.value(),
            self.low.value(),
            self.close.value(),
            self.volume.value(),
        ]
        .iter()
        .all(|v| v.is_finite());

        finite
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.volume.value() >= 0.0
    }
}

/// Value Object - market name as understood by the feed (e.g. `BTC-PERP`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref, Display, Serialize, Deserialize)]
#[display(fmt = "{}", _0)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(symbol: String) -> Result<Self, String> {
        let trimmed = symbol.trim();
        if trimmed.is_empty() {
            return Err("Symbol cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

/// One entry of the resolution catalog shown in the toolbar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOption {
    pub label: &'static str,
    pub seconds: u64,
    pub feed_code: &'static str,
}

static RESOLUTION_CATALOG: [ResolutionOption; 7] = [
    ResolutionOption { label: "1m", seconds: 60, feed_code: "1" },
    ResolutionOption { label: "5m", seconds: 300, feed_code: "5" },
    ResolutionOption { label: "30m", seconds: 1_800, feed_code: "30" },
    ResolutionOption { label: "1H", seconds: 3_600, feed_code: "60" },
    ResolutionOption { label: "2H", seconds: 7_200, feed_code: "120" },
    ResolutionOption { label: "4H", seconds: 14_400, feed_code: "240" },
    ResolutionOption { label: "1D", seconds: 86_400, feed_code: "1440" },
];

/// Bar resolution selectable in the toolbar
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    StrumDisplay,
    EnumIter,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
pub enum Resolution {
    #[strum(serialize = "1m")]
    #[serde(rename = "1m")]
    OneMinute,

    #[strum(serialize = "5m")]
    #[serde(rename = "5m")]
    FiveMinutes,

    #[strum(serialize = "30m")]
    #[serde(rename = "30m")]
    ThirtyMinutes,

    #[default]
    #[strum(serialize = "1H")]
    #[serde(rename = "1H")]
    OneHour,

    #[strum(serialize = "2H")]
    #[serde(rename = "2H")]
    TwoHours,

    #[strum(serialize = "4H")]
    #[serde(rename = "4H")]
    FourHours,

    #[strum(serialize = "1D")]
    #[serde(rename = "1D")]
    OneDay,
}

impl Resolution {
    pub fn option(&self) -> &'static ResolutionOption {
        let index = match self {
            Self::OneMinute => 0,
            Self::FiveMinutes => 1,
            Self::ThirtyMinutes => 2,
            Self::OneHour => 3,
            Self::TwoHours => 4,
            Self::FourHours => 5,
            Self::OneDay => 6,
        };
        &RESOLUTION_CATALOG[index]
    }

    pub fn label(&self) -> &'static str {
        self.option().label
    }

    pub fn seconds(&self) -> u64 {
        self.option().seconds
    }

    pub fn feed_code(&self) -> &'static str {
        self.option().feed_code
    }

    pub fn all() -> impl Iterator<Item = Resolution> {
        Self::iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn catalog_matches_enum_labels() {
        for resolution in Resolution::all() {
            assert_eq!(resolution.label(), resolution.as_ref());
            assert_eq!(Resolution::from_str(resolution.label()).unwrap(), resolution);
        }
        assert_eq!(Resolution::default().feed_code(), "60");
        assert_eq!(Resolution::OneDay.seconds(), 86_400);
    }

    #[test]
    fn ohlc_invariant() {
        let ok = OHLCV::new(
            Price::from(10.0),
            Price::from(12.0),
            Price::from(9.0),
            Price::from(11.0),
            Volume::from(1.0),
        );
        assert!(ok.is_valid());

        let bad = OHLCV { low: Price::from(10.5), ..ok };
        assert!(!bad.is_valid());
        let nan = OHLCV { close: Price::from(f64::NAN), ..ok };
        assert!(!nan.is_valid());
    }
}
