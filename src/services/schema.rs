//! Structural validation of upstream payloads.
//!
//! Every response body is parsed into a declared schema type before it is
//! allowed into the domain model. Required fields, JSON types and
//! nullability are enforced by the type's `Deserialize` impl; the helpers
//! here cover the cases serde does not express on its own.

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::error::FeedError;
use crate::models::market::{GlobalEnvelope, MarketCoin, NumberOrString, TrendingEnvelope};

/// A payload shape a feed endpoint is expected to return.
pub trait Schema: DeserializeOwned {
    /// Used in validation error messages.
    const NAME: &'static str;
}

impl Schema for GlobalEnvelope {
    const NAME: &'static str = "global";
}

impl Schema for Vec<MarketCoin> {
    const NAME: &'static str = "coins/markets";
}

impl Schema for TrendingEnvelope {
    const NAME: &'static str = "search/trending";
}

/// Parses `body` as JSON and checks it against `T`.
///
/// Syntax errors and shape mismatches both surface as
/// [`FeedError::Validation`]; nothing partially typed is returned.
pub fn validate<T: Schema>(body: &str) -> Result<T, FeedError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| FeedError::validation(format!("{}: body is not JSON: {}", T::NAME, e)))?;

    serde_json::from_value(value).map_err(|e| FeedError::validation(format!("{}: {}", T::NAME, e)))
}

/// Field that must be present but may be `null`.
///
/// Plain `Option<T>` fields treat a missing key as `None`; routing the field
/// through `deserialize_with` makes serde report the key as missing instead.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

lazy_static! {
    static ref NUMERIC_NOISE: Regex = Regex::new(r"[$,%\s]").unwrap();
}

/// Tolerant numeric coercion for mixed number/string fields.
///
/// Finite numbers pass through. Strings lose currency and percent signs,
/// thousands separators and whitespace before parsing. Absent, empty,
/// unparsable or non-finite input yields `None`.
pub fn coerce_number(value: Option<&NumberOrString>) -> Option<f64> {
    let parsed = match value? {
        NumberOrString::Number(n) => *n,
        NumberOrString::Text(raw) => {
            let cleaned = NUMERIC_NOISE.replace_all(raw, "");
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()?
        }
    };

    parsed.is_finite().then_some(parsed)
}
