use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use crate::error::FeedError;

/// The three independently polled data sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Global,
    TopCoins,
    Trending,
}

impl FeedKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedKind::Global => "global",
            FeedKind::TopCoins => "top_coins",
            FeedKind::Trending => "trending",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Pending,
    Success,
    Error,
}

/// Point-in-time view of one feed.
///
/// `data` survives a failed refresh: `status == Error` with `data.is_some()`
/// means stale data plus a fresh error, `data.is_none()` means nothing was
/// ever received.
#[derive(Debug)]
pub struct FeedState<T> {
    pub status: FeedStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<FeedError>,
    pub is_fetching: bool,
    pub data_updated_at: Option<DateTime<Utc>>,
    pub error_updated_at: Option<DateTime<Utc>>,
}

impl<T> FeedState<T> {
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Error worth showing in place of the panel: only when there is nothing
    /// else to show.
    pub fn blocking_error(&self) -> Option<&FeedError> {
        match (&self.data, self.status) {
            (None, FeedStatus::Error) => self.error.as_ref(),
            _ => None,
        }
    }
}

impl<T> Default for FeedState<T> {
    fn default() -> Self {
        Self {
            status: FeedStatus::Pending,
            data: None,
            error: None,
            is_fetching: false,
            data_updated_at: None,
            error_updated_at: None,
        }
    }
}

// Manual impl: `Arc<T>` is cloneable for any `T`.
impl<T> Clone for FeedState<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            is_fetching: self.is_fetching,
            data_updated_at: self.data_updated_at,
            error_updated_at: self.error_updated_at,
        }
    }
}
