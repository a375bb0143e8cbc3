//! Technical indicators derived from the daily price column.
//!
//! All windows are trailing and uncentered. A row is emitted only once every
//! indicator is defined, so the first 59 normalized rows (dominated by the
//! 60-day moving average) never reach the model.

use crate::domain::market::types::{FeatureRow, HistoryRow};
use statrs::statistics::{Data, Distribution};

pub const RSI_PERIOD: usize = 14;
const RSI_EPSILON: f64 = 1e-8;

/// Derive [`FeatureRow`]s from normalized history. Pure and deterministic.
pub fn engineer_features(history: &[HistoryRow]) -> Vec<FeatureRow> {
    let prices: Vec<f64> = history.iter().map(|r| r.price).collect();

    let ret_1d = pct_change(&prices);
    let ma_5 = rolling_mean(&to_options(&prices), 5);
    let ma_10 = rolling_mean(&to_options(&prices), 10);
    let ma_20 = rolling_mean(&to_options(&prices), 20);
    let ma_60 = rolling_mean(&to_options(&prices), 60);
    let vol_10 = rolling_std(&ret_1d, 10);
    let vol_20 = rolling_std(&ret_1d, 20);
    let rsi_14 = rsi(&prices, RSI_PERIOD);

    history
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            Some(FeatureRow {
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                price: row.price,
                volume: row.volume,
                chg_pct: row.chg_pct,
                ret_1d: ret_1d[i]?,
                ma_5: ma_5[i]?,
                ma_10: ma_10[i]?,
                ma_20: ma_20[i]?,
                ma_60: ma_60[i]?,
                vol_10: vol_10[i]?,
                vol_20: vol_20[i]?,
                rsi_14: rsi_14[i]?,
            })
        })
        .collect()
}

fn to_options(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().map(|v| Some(*v)).collect()
}

/// Simple percent change between consecutive values; the first is undefined.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);
    for pair in values.windows(2) {
        out.push(Some((pair[1] - pair[0]) / pair[0]));
    }
    out
}

/// Apply `f` to every full trailing window. Windows containing an undefined
/// value, or on which `f` returns `None`, stay undefined.
fn rolling<F>(values: &[Option<f64>], window: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    for end in window..=values.len() {
        let slice: Option<Vec<f64>> = values[end - window..end].iter().copied().collect();
        out[end - 1] = slice.and_then(|w| f(&w)).filter(|v| v.is_finite());
    }
    out
}

pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| Some(w.iter().sum::<f64>() / w.len() as f64))
}

/// Trailing sample standard deviation (n - 1 denominator).
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| Data::new(w.to_vec()).std_dev())
}

/// Classic RSI with simple-moving-average smoothing of gains and losses.
pub fn rsi(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut gains = Vec::with_capacity(prices.len());
    let mut losses = Vec::with_capacity(prices.len());
    if !prices.is_empty() {
        gains.push(None);
        losses.push(None);
    }
    for pair in prices.windows(2) {
        let d = pair[1] - pair[0];
        gains.push(Some(d.max(0.0)));
        losses.push(Some((-d).max(0.0)));
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(g, l)| {
            let (g, l) = ((*g)?, (*l)?);
            let rs = g / (l + RSI_EPSILON);
            Some(100.0 - 100.0 / (1.0 + rs))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn history(prices: &[f64]) -> Vec<HistoryRow> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| HistoryRow {
                date: start + Duration::days(i as i64),
                open: *p,
                high: p + 1.0,
                low: p - 1.0,
                price: *p,
                volume: 1_000.0,
                chg_pct: 0.0,
            })
            .collect()
    }

    fn zigzag(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64) * 0.1 + if i % 2 == 0 { 1.5 } else { -1.0 })
            .collect()
    }

    #[test]
    fn test_output_length_drops_leading_59_rows() {
        let rows = engineer_features(&history(&zigzag(120)));
        assert_eq!(rows.len(), 120 - 59);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + Duration::days(59));
    }

    #[test]
    fn test_too_short_history_yields_nothing() {
        assert!(engineer_features(&history(&zigzag(59))).is_empty());
        assert_eq!(engineer_features(&history(&zigzag(60))).len(), 1);
        assert!(engineer_features(&[]).is_empty());
    }

    #[test]
    fn test_moving_average_values() {
        let prices: Vec<f64> = (1..=70).map(|v| v as f64).collect();
        let rows = engineer_features(&history(&prices));
        let first = &rows[0];
        // Row index 59 holds price 60.
        assert_eq!(first.price, 60.0);
        assert!((first.ma_5 - 58.0).abs() < 1e-9);
        assert!((first.ma_10 - 55.5).abs() < 1e-9);
        assert!((first.ma_20 - 50.5).abs() < 1e-9);
        assert!((first.ma_60 - 30.5).abs() < 1e-9);
        assert!((first.ret_1d - (60.0 / 59.0 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_std_matches_sample_definition() {
        let values = to_options(&[1.0, 2.0, 3.0, 4.0]);
        let std = rolling_std(&values, 4);
        // Sample variance of 1..4 is 5/3.
        assert!((std[3].unwrap() - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!(std[2].is_none());
    }

    #[test]
    fn test_rolling_skips_windows_with_gaps() {
        let values = vec![None, Some(1.0), Some(2.0), Some(3.0)];
        let mean = rolling_mean(&values, 3);
        assert_eq!(mean, vec![None, None, None, Some(2.0)]);
    }

    #[test]
    fn test_rsi_bounded() {
        let prices = zigzag(200);
        for value in rsi(&prices, RSI_PERIOD).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&value), "rsi out of range: {}", value);
        }

        let rising: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let last = rsi(&rising, RSI_PERIOD).last().copied().flatten().unwrap();
        assert!(last > 99.99 && last <= 100.0);
    }

    #[test]
    fn test_rsi_is_fifty_when_gains_equal_losses() {
        // Alternating +1 / -1 moves: 7 gains and 7 losses in every 14-day window.
        let prices: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
        let last = rsi(&prices, RSI_PERIOD).last().copied().flatten().unwrap();
        assert!((last - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_deterministic() {
        let input = history(&zigzag(90));
        assert_eq!(engineer_features(&input), engineer_features(&input));
    }
}
