use reqwest::{Client, Url};
use std::fmt;
use std::time::Instant;

use crate::config::{ApiKey, Settings};
use crate::error::FeedError;
use crate::models::market::{
    GlobalEnvelope, GlobalMarketSnapshot, MarketCoin, TrendingEnvelope, TrendingCoin, TrendingEntry,
};
use crate::services::schema::{self, Schema, coerce_number};

/// Page size requested from /coins/markets
pub const TOP_COINS_PAGE_SIZE: i64 = 15;

/// Number of trending coins kept after sorting by score
pub const TRENDING_LIMIT: usize = 7;

/// Query parameter value, stringified when the URL is built
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Text(String),
    Integer(i64),
    Bool(bool),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Text(s) => f.write_str(s),
            QueryValue::Integer(n) => write!(f, "{}", n),
            QueryValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Integer(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

/// Client for the three CoinGecko feeds the dashboard reads
#[derive(Clone)]
pub struct CoinGeckoService {
    client: Client,
    base_url: Url,
    api_key: Option<ApiKey>,
}

impl CoinGeckoService {
    pub fn new(settings: &Settings) -> Result<Self, FeedError> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    /// Builds the request URL: endpoint joined onto the base, then the
    /// query parameters appended.
    pub fn endpoint_url(
        &self,
        endpoint: &str,
        params: &[(&str, QueryValue)],
    ) -> Result<Url, FeedError> {
        let normalized = endpoint.trim_start_matches('/');
        let mut url = self
            .base_url
            .join(normalized)
            .map_err(|e| FeedError::transport(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, &value.to_string());
            }
        }

        Ok(url)
    }

    /// GET `endpoint` and validate the body against `T`.
    ///
    /// No retries; a non-2xx status is [`FeedError::HttpStatus`], a body that
    /// does not match `T` is [`FeedError::Validation`].
    pub async fn fetch<T: Schema>(
        &self,
        endpoint: &str,
        params: &[(&str, QueryValue)],
    ) -> Result<T, FeedError> {
        let url = self.endpoint_url(endpoint, params)?;
        let start = Instant::now();

        tracing::debug!(url = %url, "Fetching from CoinGecko");

        let mut request = self
            .client
            .get(url)
            .header("accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header(key.tier.header_name(), &key.value);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                endpoint = endpoint,
                status = status.as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "CoinGecko returned error status"
            );
            return Err(FeedError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed = schema::validate::<T>(&body)?;

        tracing::debug!(
            endpoint = endpoint,
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "CoinGecko response validated"
        );

        Ok(parsed)
    }

    pub async fn fetch_global_market_snapshot(&self) -> Result<GlobalMarketSnapshot, FeedError> {
        let envelope: GlobalEnvelope = self.fetch("/global", &[]).await?;
        Ok(envelope.data)
    }

    /// Top coins by market cap with sparkline and 24h/7d changes
    pub async fn fetch_top_coins(&self) -> Result<Vec<MarketCoin>, FeedError> {
        self.fetch("/coins/markets", &top_coins_params()).await
    }

    /// Trending coins, normalized and ordered by score
    pub async fn fetch_trending_coins(&self) -> Result<Vec<TrendingCoin>, FeedError> {
        let envelope: TrendingEnvelope = self.fetch("/search/trending", &[]).await?;
        Ok(normalize_trending(envelope.coins))
    }
}

fn top_coins_params() -> Vec<(&'static str, QueryValue)> {
    vec![
        ("vs_currency", "usd".into()),
        ("order", "market_cap_desc".into()),
        ("per_page", TOP_COINS_PAGE_SIZE.into()),
        ("page", 1i64.into()),
        ("sparkline", true.into()),
        ("price_change_percentage", "24h,7d".into()),
    ]
}

/// Maps raw trending entries to [`TrendingCoin`]s, ascending by score,
/// truncated to [`TRENDING_LIMIT`].
pub fn normalize_trending(entries: Vec<TrendingEntry>) -> Vec<TrendingCoin> {
    let mut coins: Vec<TrendingCoin> = entries
        .into_iter()
        .map(|TrendingEntry { item }| {
            let data = item.data.unwrap_or_default();
            let price_change = data
                .price_change_percentage_24h
                .as_ref()
                .and_then(|changes| coerce_number(changes.usd.as_ref()));

            TrendingCoin {
                price_usd: coerce_number(data.price.as_ref()),
                price_change_24h_usd: price_change,
                id: item.id,
                name: item.name,
                symbol: item.symbol,
                market_cap_rank: item.market_cap_rank,
                score: item.score,
                price_btc: item.price_btc,
                thumb: item.thumb,
            }
        })
        .collect();

    coins.sort_by_key(|coin| coin.score);
    coins.truncate(TRENDING_LIMIT);
    coins
}
