use crate::domain::market::types::HistoryBar;
use chrono::DateTime;
use serde::Deserialize;

// ===== Chart API payload =====

#[derive(Debug, Deserialize)]
pub struct ChartEnvelope {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

impl ChartResult {
    /// Zip the column arrays into bars, skipping any bar with a null field.
    pub fn into_bars(self) -> Vec<HistoryBar> {
        let offset = self.meta.gmtoffset;
        let Some(quote) = self.indicators.quote.into_iter().next() else {
            return Vec::new();
        };

        let at = |col: &[Option<f64>], i: usize| col.get(i).copied().flatten();

        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, ts)| {
                let date = DateTime::from_timestamp(ts + offset, 0)?.date_naive();
                Some(HistoryBar {
                    date,
                    open: at(&quote.open, i)?,
                    high: at(&quote.high, i)?,
                    low: at(&quote.low, i)?,
                    close: at(&quote.close, i)?,
                    volume: at(&quote.volume, i)?,
                })
            })
            .collect()
    }
}

impl ChartEnvelope {
    pub fn into_bars(self) -> Vec<HistoryBar> {
        self.chart
            .result
            .and_then(|results| results.into_iter().next())
            .map(ChartResult::into_bars)
            .unwrap_or_default()
    }
}
