use crate::domain::market::types::FeatureRow;
use std::fmt;
use std::str::FromStr;

/// A named model input column.
///
/// Names match the column headers used when the bundles were trained,
/// so metadata files can refer to them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureColumn {
    Price,
    Open,
    High,
    Low,
    Volume,
    ChgPct,
    Ret1d,
    Ma5,
    Ma10,
    Ma20,
    Ma60,
    Vol10,
    Vol20,
    Rsi14,
}

/// Ordered default column set.
/// Any change here is a breaking change for bundles without explicit `feature_cols`.
pub const DEFAULT_FEATURE_COLUMNS: [FeatureColumn; 14] = [
    FeatureColumn::Price,
    FeatureColumn::Open,
    FeatureColumn::High,
    FeatureColumn::Low,
    FeatureColumn::Volume,
    FeatureColumn::ChgPct,
    FeatureColumn::Ret1d,
    FeatureColumn::Ma5,
    FeatureColumn::Ma10,
    FeatureColumn::Ma20,
    FeatureColumn::Ma60,
    FeatureColumn::Vol10,
    FeatureColumn::Vol20,
    FeatureColumn::Rsi14,
];

impl FeatureColumn {
    pub fn name(&self) -> &'static str {
        match self {
            FeatureColumn::Price => "Price",
            FeatureColumn::Open => "Open",
            FeatureColumn::High => "High",
            FeatureColumn::Low => "Low",
            FeatureColumn::Volume => "Volume",
            FeatureColumn::ChgPct => "Chg%",
            FeatureColumn::Ret1d => "ret_1d",
            FeatureColumn::Ma5 => "ma_5",
            FeatureColumn::Ma10 => "ma_10",
            FeatureColumn::Ma20 => "ma_20",
            FeatureColumn::Ma60 => "ma_60",
            FeatureColumn::Vol10 => "vol_10",
            FeatureColumn::Vol20 => "vol_20",
            FeatureColumn::Rsi14 => "rsi_14",
        }
    }

    /// Read this column out of an engineered row.
    pub fn value(&self, row: &FeatureRow) -> f64 {
        match self {
            FeatureColumn::Price => row.price,
            FeatureColumn::Open => row.open,
            FeatureColumn::High => row.high,
            FeatureColumn::Low => row.low,
            FeatureColumn::Volume => row.volume,
            FeatureColumn::ChgPct => row.chg_pct,
            FeatureColumn::Ret1d => row.ret_1d,
            FeatureColumn::Ma5 => row.ma_5,
            FeatureColumn::Ma10 => row.ma_10,
            FeatureColumn::Ma20 => row.ma_20,
            FeatureColumn::Ma60 => row.ma_60,
            FeatureColumn::Vol10 => row.vol_10,
            FeatureColumn::Vol20 => row.vol_20,
            FeatureColumn::Rsi14 => row.rsi_14,
        }
    }
}

impl fmt::Display for FeatureColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeatureColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DEFAULT_FEATURE_COLUMNS
            .iter()
            .find(|c| c.name() == s)
            .copied()
            .ok_or_else(|| format!("unknown feature column '{}'", s))
    }
}
