use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which 24h price direction the coin table shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendFilter {
    #[default]
    All,
    Gainers,
    Losers,
}

impl TrendFilter {
    pub const ALL: [TrendFilter; 3] = [TrendFilter::All, TrendFilter::Gainers, TrendFilter::Losers];

    pub fn as_str(self) -> &'static str {
        match self {
            TrendFilter::All => "all",
            TrendFilter::Gainers => "gainers",
            TrendFilter::Losers => "losers",
        }
    }
}

/// Column the coin table is ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    MarketCapRank,
    CurrentPrice,
    MarketCap,
    #[serde(rename = "price_change_24h")]
    PriceChange24h,
    #[serde(rename = "price_change_7d")]
    PriceChange7d,
    TotalVolume,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::MarketCapRank,
        SortKey::CurrentPrice,
        SortKey::MarketCap,
        SortKey::PriceChange24h,
        SortKey::PriceChange7d,
        SortKey::TotalVolume,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::MarketCapRank => "market_cap_rank",
            SortKey::CurrentPrice => "current_price",
            SortKey::MarketCap => "market_cap",
            SortKey::PriceChange24h => "price_change_24h",
            SortKey::PriceChange7d => "price_change_7d",
            SortKey::TotalVolume => "total_volume",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::MarketCapRank => "Market Cap Rank",
            SortKey::CurrentPrice => "Current Price",
            SortKey::MarketCap => "Market Cap",
            SortKey::PriceChange24h => "24h Change",
            SortKey::PriceChange7d => "7d Change",
            SortKey::TotalVolume => "24h Volume",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

macro_rules! impl_wire_name {
    ($ty:ty, $what:literal, $variants:expr) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase();
                $variants
                    .into_iter()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| format!("unknown {} '{}'", $what, s))
            }
        }
    };
}

impl_wire_name!(TrendFilter, "trend filter", TrendFilter::ALL);
impl_wire_name!(SortKey, "sort key", SortKey::ALL);
impl_wire_name!(SortDirection, "sort direction", [SortDirection::Asc, SortDirection::Desc]);

/// User-controlled view state of the coin table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewPreferences {
    pub search_term: String,
    pub trend_filter: TrendFilter,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
}
