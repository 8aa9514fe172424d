use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::services::schema::nullable;

/// Envelope returned by GET /global
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalEnvelope {
    pub data: GlobalMarketSnapshot,
}

/// Aggregate market metrics from GET /global
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalMarketSnapshot {
    pub active_cryptocurrencies: u64,
    pub markets: u64,
    pub total_market_cap: BTreeMap<String, f64>, // currency code -> cap
    pub total_volume: BTreeMap<String, f64>,     // currency code -> volume
    pub market_cap_percentage: BTreeMap<String, f64>, // symbol -> share of total cap
    pub market_cap_change_percentage_24h_usd: f64,
    pub updated_at: i64, // Unix seconds
}

/// One row of GET /coins/markets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCoin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: String,
    pub current_price: f64,
    pub market_cap: f64,
    #[serde(deserialize_with = "nullable")]
    pub market_cap_rank: Option<u32>,
    pub total_volume: f64,
    #[serde(deserialize_with = "nullable")]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_7d_in_currency: Option<f64>,
    #[serde(default)]
    pub sparkline_in_7d: Option<SparklineSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparklineSeries {
    pub price: Vec<f64>,
}

impl MarketCoin {
    /// 7 day price history, empty when the feed sent none.
    pub fn sparkline_prices(&self) -> &[f64] {
        self.sparkline_in_7d
            .as_ref()
            .map(|s| s.price.as_slice())
            .unwrap_or(&[])
    }
}

/// Envelope returned by GET /search/trending
#[derive(Debug, Clone, Deserialize)]
pub struct TrendingEnvelope {
    pub coins: Vec<TrendingEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendingEntry {
    pub item: TrendingItem,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendingItem {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(deserialize_with = "nullable")]
    pub market_cap_rank: Option<u32>,
    pub thumb: String,
    pub score: u32,
    pub price_btc: f64,
    #[serde(default)]
    pub data: Option<TrendingItemData>,
}

/// Loosely typed market block of a trending item; unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendingItemData {
    #[serde(default)]
    pub price: Option<NumberOrString>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<CurrencyValues>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrencyValues {
    #[serde(default)]
    pub usd: Option<NumberOrString>,
}

/// A field the trending feed sends either as a JSON number or as a
/// formatted string such as `"$0.0031"` or `"1,234.5%"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(f64),
    Text(String),
}

/// UI-ready trending coin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingCoin {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub market_cap_rank: Option<u32>,
    pub score: u32, // zero-based
    pub price_btc: f64,
    pub price_usd: Option<f64>,
    pub price_change_24h_usd: Option<f64>,
    pub thumb: String,
}
