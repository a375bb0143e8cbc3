use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar as delivered by the market data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Normalized daily row: close renamed to `price`, plus the
/// day-over-day percentage change (`Chg%`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub price: f64,
    pub volume: f64,
    pub chg_pct: f64,
}

/// A history row with every rolling indicator resolved.
///
/// Rows only exist once the longest window (60 days) is fully populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub price: f64,
    pub volume: f64,
    pub chg_pct: f64,
    pub ret_1d: f64,
    pub ma_5: f64,
    pub ma_10: f64,
    pub ma_20: f64,
    pub ma_60: f64,
    pub vol_10: f64,
    pub vol_20: f64,
    pub rsi_14: f64,
}

/// How far back the provider should look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRange {
    /// Everything the provider has.
    Max,
    /// From the given date up to today.
    Since(NaiveDate),
}
