//! Derived views over raw feed data.
//!
//! Everything here is a pure function of (feed data, preferences); callers
//! recompute whenever an input changes.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::models::feed::{FeedState, FeedStatus};
use crate::models::market::{GlobalMarketSnapshot, MarketCoin};
use crate::models::preferences::{SortDirection, SortKey, TrendFilter, ViewPreferences};
use crate::models::views::{
    DominanceEntry, HeadlineMetrics, PanelState, SparklineGeometry, SparklinePoint, SparklineTrend,
};

/// Number of assets shown in the dominance ranking
pub const DOMINANCE_LIMIT: usize = 4;

/// Coins matching the search term and trend filter, ordered by the chosen
/// sort key and direction.
pub fn visible_coins<'a>(coins: &'a [MarketCoin], prefs: &ViewPreferences) -> Vec<&'a MarketCoin> {
    let term = prefs.search_term.trim().to_lowercase();

    let mut visible: Vec<&MarketCoin> = coins
        .iter()
        .filter(|coin| matches_search(coin, &term))
        .filter(|coin| passes_trend_filter(coin, prefs.trend_filter))
        .collect();

    // Stable: equal keys and null pairs keep feed order.
    visible.sort_by(|a, b| compare_coins(a, b, prefs.sort_key, prefs.sort_direction));
    visible
}

/// `term` must already be trimmed and lower-cased.
fn matches_search(coin: &MarketCoin, term: &str) -> bool {
    term.is_empty()
        || coin.name.to_lowercase().contains(term)
        || coin.symbol.to_lowercase().contains(term)
}

/// Missing 24h change counts as 0, so it is neither a gainer nor a loser.
pub fn passes_trend_filter(coin: &MarketCoin, filter: TrendFilter) -> bool {
    let change = coin.price_change_percentage_24h.unwrap_or(0.0);
    match filter {
        TrendFilter::All => true,
        TrendFilter::Gainers => change > 0.0,
        TrendFilter::Losers => change < 0.0,
    }
}

pub fn sort_value(coin: &MarketCoin, key: SortKey) -> Option<f64> {
    match key {
        SortKey::MarketCapRank => coin.market_cap_rank.map(f64::from),
        SortKey::CurrentPrice => Some(coin.current_price),
        SortKey::MarketCap => Some(coin.market_cap),
        SortKey::PriceChange24h => coin.price_change_percentage_24h,
        SortKey::PriceChange7d => coin.price_change_percentage_7d_in_currency,
        SortKey::TotalVolume => Some(coin.total_volume),
    }
}

/// Nulls go last whatever the direction; the direction only flips
/// comparisons between two present values.
pub fn compare_coins(
    a: &MarketCoin,
    b: &MarketCoin,
    key: SortKey,
    direction: SortDirection,
) -> Ordering {
    match (sort_value(a, key), sort_value(b, key)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(va), Some(vb)) => {
            let ordering = va.partial_cmp(&vb).unwrap_or(Ordering::Equal);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
    }
}

/// Top assets by share of total market cap, largest first.
pub fn dominance_ranking(snapshot: Option<&GlobalMarketSnapshot>) -> Vec<DominanceEntry> {
    let Some(snapshot) = snapshot else {
        return Vec::new();
    };

    let mut entries: Vec<DominanceEntry> = snapshot
        .market_cap_percentage
        .iter()
        .map(|(symbol, percentage)| DominanceEntry {
            symbol: symbol.clone(),
            percentage: *percentage,
        })
        .collect();

    // Map iteration is by symbol, so ties stay alphabetical.
    entries.sort_by(|a, b| {
        b.percentage
            .partial_cmp(&a.percentage)
            .unwrap_or(Ordering::Equal)
    });
    entries.truncate(DOMINANCE_LIMIT);
    entries
}

/// Line and fill geometry in a 100x100 viewbox, `None` below two points.
pub fn sparkline(points: &[f64], change_7d: Option<f64>) -> Option<SparklineGeometry> {
    if points.len() < 2 {
        return None;
    }

    let min = points.iter().copied().fold(f64::INFINITY, f64::min);
    let max = points.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if max - min == 0.0 { 1.0 } else { max - min };
    let denominator = (points.len() - 1) as f64;

    let line: Vec<SparklinePoint> = points
        .iter()
        .enumerate()
        .map(|(index, price)| SparklinePoint {
            x: index as f64 / denominator * 100.0,
            y: 100.0 - (price - min) / range * 100.0,
        })
        .collect();

    let mut fill = line.clone();
    fill.push(SparklinePoint { x: 100.0, y: 100.0 });
    fill.push(SparklinePoint { x: 0.0, y: 100.0 });

    let trend = if change_7d.unwrap_or(0.0) >= 0.0 {
        SparklineTrend::NonNegative
    } else {
        SparklineTrend::Negative
    };

    Some(SparklineGeometry { line, fill, trend })
}

pub fn headline_metrics(snapshot: &GlobalMarketSnapshot) -> HeadlineMetrics {
    HeadlineMetrics {
        total_market_cap_usd: snapshot.total_market_cap.get("usd").copied().unwrap_or(0.0),
        total_volume_usd: snapshot.total_volume.get("usd").copied().unwrap_or(0.0),
        market_cap_change_24h: snapshot.market_cap_change_percentage_24h_usd,
        active_cryptocurrencies: snapshot.active_cryptocurrencies,
        markets: snapshot.markets,
        updated_at: snapshot.updated_at,
    }
}

/// Panel for a list-valued feed. An error replaces the panel only while
/// there is nothing to show.
pub fn list_panel<T>(state: &FeedState<Vec<T>>) -> PanelState<Arc<Vec<T>>> {
    match &state.data {
        Some(items) if !items.is_empty() => PanelState::Ready(Arc::clone(items)),
        _ => match (state.status, &state.error) {
            (FeedStatus::Error, Some(err)) => PanelState::Failed(err.clone()),
            _ if state.data.is_some() => PanelState::Empty,
            _ => PanelState::Loading,
        },
    }
}
