//! Error types shared by the feed client, the refresh coordinator and the
//! preference store.

use thiserror::Error;

/// Failure of a single feed fetch.
///
/// Kept `Clone` so a feed can hold on to its latest error next to its last
/// good data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    /// The request never produced a response (DNS, connect, TLS, reset).
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The upstream answered with a non-2xx status.
    #[error("CoinGecko request failed: {status}")]
    HttpStatus { status: u16 },

    /// The body was not JSON or did not match the declared shape.
    #[error("unexpected response shape: {details}")]
    Validation { details: String },
}

impl FeedError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }

    pub fn validation(details: impl Into<String>) -> Self {
        Self::Validation {
            details: details.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::HttpStatus {
                status: status.as_u16(),
            };
        }
        if err.is_decode() {
            return Self::validation(err.to_string());
        }
        Self::transport(err)
    }
}

/// Failure to read or write a persisted preference.
///
/// Never surfaced to callers of the preference store: it is logged and the
/// in-memory value wins.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode value for key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Invalid runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
