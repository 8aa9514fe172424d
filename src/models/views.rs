use serde::Serialize;

use crate::error::FeedError;

/// One row of the dominance ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DominanceEntry {
    pub symbol: String,
    pub percentage: f64,
}

/// Colour class of a sparkline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SparklineTrend {
    NonNegative,
    Negative,
}

/// Point in the 0..=100 sparkline viewbox
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SparklinePoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SparklineGeometry {
    pub line: Vec<SparklinePoint>,
    /// `line` closed along the bottom edge.
    pub fill: Vec<SparklinePoint>,
    pub trend: SparklineTrend,
}

/// Badge classification of a percentage change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Positive,
    Negative,
    Flat,
    Unknown,
}

impl TrendDirection {
    /// Null and NaN are `Unknown`; exactly zero is `Flat`.
    pub fn classify(change: Option<f64>) -> Self {
        match change {
            Some(v) if v.is_nan() => Self::Unknown,
            Some(v) if v > 0.0 => Self::Positive,
            Some(v) if v < 0.0 => Self::Negative,
            Some(_) => Self::Flat,
            None => Self::Unknown,
        }
    }
}

/// Headline numbers from the global snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlineMetrics {
    pub total_market_cap_usd: f64,
    pub total_volume_usd: f64,
    pub market_cap_change_24h: f64,
    pub active_cryptocurrencies: u64,
    pub markets: u64,
    pub updated_at: i64,
}

/// What a single dashboard panel should display
#[derive(Debug, Clone, PartialEq)]
pub enum PanelState<T> {
    Loading,
    Failed(FeedError),
    Empty,
    Ready(T),
}

/// Whole-page status
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardHealth {
    /// Nothing received and nothing failed yet.
    Loading,
    /// No feed has data and at least one reported an error.
    Unavailable(FeedError),
    Ready,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_direction_classify() {
        assert_eq!(TrendDirection::classify(Some(1.5)), TrendDirection::Positive);
        assert_eq!(TrendDirection::classify(Some(-0.1)), TrendDirection::Negative);
        assert_eq!(TrendDirection::classify(Some(0.0)), TrendDirection::Flat);
        assert_eq!(TrendDirection::classify(Some(f64::NAN)), TrendDirection::Unknown);
        assert_eq!(TrendDirection::classify(None), TrendDirection::Unknown);
    }
}
