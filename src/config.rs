//! Runtime settings, read from the environment (after `.env` is loaded).

use reqwest::Url;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_PREFS_DIR: &str = ".crypto-dashboard";
pub const DEFAULT_RENDER_INTERVAL_SECS: u64 = 30;

const ENV_BASE_URL: &str = "COINGECKO_BASE_URL";
const ENV_API_KEY: &str = "COINGECKO_API_KEY";
const ENV_API_TIER: &str = "COINGECKO_API_TIER";
const ENV_PREFS_DIR: &str = "DASHBOARD_PREFS_DIR";
const ENV_RENDER_INTERVAL: &str = "DASHBOARD_RENDER_INTERVAL_SECS";

/// Which CoinGecko key header to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiTier {
    Demo,
    Pro,
}

impl ApiTier {
    pub fn header_name(self) -> &'static str {
        match self {
            ApiTier::Demo => "x-cg-demo-api-key",
            ApiTier::Pro => "x-cg-pro-api-key",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiKey {
    pub tier: ApiTier,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: Url,
    pub api_key: Option<ApiKey>,
    pub prefs_dir: PathBuf,
    pub render_interval: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_base = lookup(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_base_url(&raw_base)?;

        let tier = match lookup(ENV_API_TIER).map(|v| v.to_lowercase()) {
            Some(ref t) if t == "pro" => ApiTier::Pro,
            _ => ApiTier::Demo,
        };
        let api_key = lookup(ENV_API_KEY)
            .filter(|value| !value.trim().is_empty())
            .map(|value| ApiKey { tier, value });

        let prefs_dir = lookup(ENV_PREFS_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFS_DIR));

        let render_interval_secs = match lookup(ENV_RENDER_INTERVAL) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    var: ENV_RENDER_INTERVAL,
                    reason: format!("expected a positive integer, got '{}'", raw),
                })?,
            None => DEFAULT_RENDER_INTERVAL_SECS,
        };

        Ok(Self {
            base_url,
            api_key,
            prefs_dir,
            render_interval: Duration::from_secs(render_interval_secs),
        })
    }

    /// Settings pointing at a custom upstream, everything else defaulted.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = base_url.to_string();
        Self::from_lookup(move |name| (name == ENV_BASE_URL).then(|| base_url.clone()))
    }
}

/// Parses the base URL and guarantees a trailing slash so relative endpoint
/// joins keep the `/api/v3` prefix.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    let url = Url::parse(&normalized).map_err(|e| ConfigError::Invalid {
        var: ENV_BASE_URL,
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::Invalid {
            var: ENV_BASE_URL,
            reason: format!("'{}' cannot be used as a base URL", raw),
        });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings.base_url.as_str(), "https://api.coingecko.com/api/v3/");
        assert!(settings.api_key.is_none());
        assert_eq!(settings.prefs_dir, PathBuf::from(DEFAULT_PREFS_DIR));
        assert_eq!(settings.render_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_pro_key_header() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("COINGECKO_API_KEY", "abc"),
            ("COINGECKO_API_TIER", "PRO"),
        ]))
        .unwrap();
        let key = settings.api_key.unwrap();
        assert_eq!(key.tier.header_name(), "x-cg-pro-api-key");
        assert_eq!(key.value, "abc");
    }

    #[test]
    fn test_blank_key_is_ignored() {
        let settings =
            Settings::from_lookup(lookup_from(&[("COINGECKO_API_KEY", "   ")])).unwrap();
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn test_invalid_render_interval() {
        let result =
            Settings::from_lookup(lookup_from(&[("DASHBOARD_RENDER_INTERVAL_SECS", "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(Settings::with_base_url("not a url").is_err());
    }
}
