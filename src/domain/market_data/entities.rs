pub use super::value_objects::{OHLCV, Price, Timestamp, Volume};
use serde::{Deserialize, Serialize};

/// Domain entity - one OHLCV bar.
///
/// Bars are immutable once parsed; a refresh produces new bars instead of
/// mutating resident ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open_time: Timestamp,
    pub ohlcv: OHLCV,
}

impl Bar {
    pub fn new(open_time: Timestamp, ohlcv: OHLCV) -> Self {
        Self { open_time, ohlcv }
    }

    pub fn is_well_formed(&self) -> bool {
        self.ohlcv.is_valid()
    }

    /// Copy of this bar with its open time moved forward.
    pub fn shifted(&self, millis: u64) -> Self {
        Self { open_time: self.open_time.shifted_by(millis), ohlcv: self.ohlcv }
    }
}

/// Sort by open time and drop duplicate timestamps, keeping the first
/// occurrence of each.
pub fn normalize_bars(mut bars: Vec<Bar>) -> Vec<Bar> {
    bars.sort_by_key(|bar| bar.open_time);
    bars.dedup_by_key(|bar| bar.open_time);
    bars
}

/// Merge an older history batch into the resident dataset.
///
/// Resident bars win on timestamp collisions since they may already carry
/// live updates.
pub fn merge_history(resident: &[Bar], history: Vec<Bar>) -> Vec<Bar> {
    let mut merged: Vec<Bar> = resident.to_vec();
    merged.extend(history);
    normalize_bars(merged)
}
