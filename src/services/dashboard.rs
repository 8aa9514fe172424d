//! Full dashboard view: every derived panel computed from one snapshot of
//! the feeds plus the current preferences, and a plain-text rendering of it.

use std::fmt::Write;

use crate::error::FeedError;
use crate::models::market::{MarketCoin, TrendingCoin};
use crate::models::preferences::ViewPreferences;
use crate::models::views::{
    DashboardHealth, DominanceEntry, HeadlineMetrics, PanelState, SparklineGeometry, TrendDirection,
};
use crate::services::feed_coordinator::DashboardSnapshot;
use crate::services::formatters::{
    format_btc, format_date_time, format_integer, format_percent, format_usd,
};
use crate::services::views::{
    dominance_ranking, headline_metrics, list_panel, sparkline, visible_coins,
};

#[derive(Debug, Clone)]
pub struct CoinRow {
    pub coin: MarketCoin,
    pub change_24h: TrendDirection,
    pub change_7d: TrendDirection,
    pub sparkline: Option<SparklineGeometry>,
}

#[derive(Debug, Clone)]
pub struct DashboardView {
    pub health: DashboardHealth,
    pub is_fetching: bool,
    pub preferences: ViewPreferences,
    pub headline: Option<HeadlineMetrics>,
    pub global_error: Option<FeedError>,
    pub dominance: Vec<DominanceEntry>,
    pub coins: PanelState<Vec<CoinRow>>,
    pub trending: PanelState<Vec<TrendingCoin>>,
}

pub fn build_dashboard_view(
    snapshot: &DashboardSnapshot,
    prefs: &ViewPreferences,
) -> DashboardView {
    let global = snapshot.global.data.as_deref();

    let coins = match list_panel(&snapshot.top_coins) {
        PanelState::Ready(all) => {
            let rows: Vec<CoinRow> = visible_coins(&all, prefs)
                .into_iter()
                .map(|coin| CoinRow {
                    change_24h: TrendDirection::classify(coin.price_change_percentage_24h),
                    change_7d: TrendDirection::classify(
                        coin.price_change_percentage_7d_in_currency,
                    ),
                    sparkline: sparkline(
                        coin.sparkline_prices(),
                        coin.price_change_percentage_7d_in_currency,
                    ),
                    coin: coin.clone(),
                })
                .collect();
            if rows.is_empty() {
                PanelState::Empty
            } else {
                PanelState::Ready(rows)
            }
        }
        PanelState::Loading => PanelState::Loading,
        PanelState::Empty => PanelState::Empty,
        PanelState::Failed(err) => PanelState::Failed(err),
    };

    let trending = match list_panel(&snapshot.trending) {
        PanelState::Ready(items) => PanelState::Ready(items.as_ref().clone()),
        PanelState::Loading => PanelState::Loading,
        PanelState::Empty => PanelState::Empty,
        PanelState::Failed(err) => PanelState::Failed(err),
    };

    DashboardView {
        health: snapshot.health(),
        is_fetching: snapshot.is_fetching(),
        preferences: prefs.clone(),
        headline: global.map(headline_metrics),
        global_error: snapshot.global.blocking_error().cloned(),
        dominance: dominance_ranking(global),
        coins,
        trending,
    }
}

fn badge(change: Option<f64>) -> String {
    match (TrendDirection::classify(change), change) {
        (TrendDirection::Unknown, _) | (_, None) => "n/a".to_string(),
        (_, Some(value)) => format_percent(value, true),
    }
}

pub fn render_text(view: &DashboardView) -> String {
    let mut out = String::new();

    if let DashboardHealth::Unavailable(err) = &view.health {
        let _ = writeln!(out, "Unable to load dashboard: {}", err);
        return out;
    }
    if view.health == DashboardHealth::Loading {
        let _ = writeln!(out, "Loading market data...");
        return out;
    }

    let refreshing = if view.is_fetching { "(refreshing)" } else { "" };
    let _ = writeln!(out, "== Global market {}", refreshing);
    match (&view.headline, &view.global_error) {
        (Some(h), _) => {
            let _ = writeln!(
                out,
                "Market cap {} ({} 24h) | Volume {} | {} assets, {} markets | updated {}",
                format_usd(h.total_market_cap_usd, true),
                format_percent(h.market_cap_change_24h, true),
                format_usd(h.total_volume_usd, true),
                format_integer(h.active_cryptocurrencies as f64),
                format_integer(h.markets as f64),
                format_date_time(h.updated_at),
            );
        }
        (None, Some(err)) => {
            let _ = writeln!(out, "Unable to load global market data: {}", err);
        }
        (None, None) => {
            let _ = writeln!(out, "Loading...");
        }
    }

    if !view.dominance.is_empty() {
        let shares: Vec<String> = view
            .dominance
            .iter()
            .map(|e| format!("{} {}", e.symbol.to_uppercase(), format_percent(e.percentage, false)))
            .collect();
        let _ = writeln!(out, "Dominance: {}", shares.join(" | "));
    }

    let prefs = &view.preferences;
    let _ = writeln!(
        out,
        "\n== Top coins [search '{}' | {} | {} {}]",
        prefs.search_term,
        prefs.trend_filter,
        prefs.sort_key.label(),
        prefs.sort_direction,
    );
    match &view.coins {
        PanelState::Loading => {
            let _ = writeln!(out, "Loading...");
        }
        PanelState::Failed(err) => {
            let _ = writeln!(out, "Unable to load top coins: {}", err);
        }
        PanelState::Empty => {
            let _ = writeln!(out, "No coins match the current filters.");
        }
        PanelState::Ready(rows) => {
            for row in rows {
                let c = &row.coin;
                let rank = c
                    .market_cap_rank
                    .map(|r| format!("#{}", r))
                    .unwrap_or_else(|| "-".to_string());
                let _ = writeln!(
                    out,
                    "{:>4} {:<14} {:<6} {:>14} {:>9} {:>9} {:>10} {:>10}",
                    rank,
                    c.name,
                    c.symbol.to_uppercase(),
                    format_usd(c.current_price, false),
                    badge(c.price_change_percentage_24h),
                    badge(c.price_change_percentage_7d_in_currency),
                    format_usd(c.market_cap, true),
                    format_usd(c.total_volume, true),
                );
            }
        }
    }

    let _ = writeln!(out, "\n== Trending");
    match &view.trending {
        PanelState::Loading => {
            let _ = writeln!(out, "Loading...");
        }
        PanelState::Failed(err) => {
            let _ = writeln!(out, "Unable to load trending coins: {}", err);
        }
        PanelState::Empty => {
            let _ = writeln!(out, "No trending coin data returned right now.");
        }
        PanelState::Ready(coins) => {
            for coin in coins {
                let price = coin
                    .price_usd
                    .map(|p| format_usd(p, false))
                    .unwrap_or_else(|| "n/a".to_string());
                let _ = writeln!(
                    out,
                    "#{:<2} {:<16} {:<8} {:>12} {:>18} {:>9}",
                    coin.score + 1,
                    coin.name,
                    coin.symbol.to_uppercase(),
                    price,
                    format_btc(coin.price_btc),
                    badge(coin.price_change_24h_usd),
                );
            }
        }
    }

    out
}
