//! Feed Refresh Coordinator
//!
//! Owns the cached state of the three dashboard feeds. Each feed refreshes
//! on its own cadence, failures stay local to the feed that produced them,
//! and the last good data is kept across failed refreshes.
//!
//! Explicit refreshes are never deduplicated: every call issues a new
//! request generation, and a response is applied only if its generation is
//! still the newest one when it lands. Background refreshes skip a feed that
//! already has a request in flight.

use async_trait::async_trait;
use chrono::Utc;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, join_all};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::FeedError;
use crate::jobs::feed_refresh::start_feed_refresh_jobs;
use crate::models::feed::{FeedKind, FeedState, FeedStatus};
use crate::models::market::{GlobalMarketSnapshot, MarketCoin, TrendingCoin};
use crate::models::views::DashboardHealth;
use crate::services::coingecko::CoinGeckoService;

/// Staleness window and background cadence of one feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub stale_time: Duration,
    pub refresh_interval: Duration,
}

impl RefreshPolicy {
    pub const GLOBAL: RefreshPolicy = RefreshPolicy {
        stale_time: Duration::from_secs(60),
        refresh_interval: Duration::from_secs(180),
    };
    pub const TOP_COINS: RefreshPolicy = RefreshPolicy {
        stale_time: Duration::from_secs(45),
        refresh_interval: Duration::from_secs(120),
    };
    pub const TRENDING: RefreshPolicy = RefreshPolicy {
        stale_time: Duration::from_secs(60),
        refresh_interval: Duration::from_secs(120),
    };

    pub fn for_feed(kind: FeedKind) -> Self {
        match kind {
            FeedKind::Global => Self::GLOBAL,
            FeedKind::TopCoins => Self::TOP_COINS,
            FeedKind::Trending => Self::TRENDING,
        }
    }
}

/// Something a [`PolledFeed`] can fetch
#[async_trait]
pub trait FeedSource: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    fn kind(&self) -> FeedKind;

    async fn fetch(&self) -> Result<Self::Output, FeedError>;
}

pub struct GlobalFeed(pub CoinGeckoService);
pub struct TopCoinsFeed(pub CoinGeckoService);
pub struct TrendingFeed(pub CoinGeckoService);

#[async_trait]
impl FeedSource for GlobalFeed {
    type Output = GlobalMarketSnapshot;

    fn kind(&self) -> FeedKind {
        FeedKind::Global
    }

    async fn fetch(&self) -> Result<GlobalMarketSnapshot, FeedError> {
        self.0.fetch_global_market_snapshot().await
    }
}

#[async_trait]
impl FeedSource for TopCoinsFeed {
    type Output = Vec<MarketCoin>;

    fn kind(&self) -> FeedKind {
        FeedKind::TopCoins
    }

    async fn fetch(&self) -> Result<Vec<MarketCoin>, FeedError> {
        self.0.fetch_top_coins().await
    }
}

#[async_trait]
impl FeedSource for TrendingFeed {
    type Output = Vec<TrendingCoin>;

    fn kind(&self) -> FeedKind {
        FeedKind::Trending
    }

    async fn fetch(&self) -> Result<Vec<TrendingCoin>, FeedError> {
        self.0.fetch_trending_coins().await
    }
}

struct FeedSlot<T> {
    state: FeedState<T>,
    /// Generation of the most recently issued request.
    issued: u64,
    fetched_at: Option<Instant>,
}

/// One feed plus its cached state
pub struct PolledFeed<S: FeedSource> {
    source: S,
    policy: RefreshPolicy,
    slot: RwLock<FeedSlot<S::Output>>,
}

impl<S: FeedSource> PolledFeed<S> {
    pub fn new(source: S, policy: RefreshPolicy) -> Self {
        Self {
            source,
            policy,
            slot: RwLock::new(FeedSlot {
                state: FeedState::default(),
                issued: 0,
                fetched_at: None,
            }),
        }
    }

    pub fn kind(&self) -> FeedKind {
        self.source.kind()
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    pub fn state(&self) -> FeedState<S::Output> {
        self.slot.read().state.clone()
    }

    pub fn is_fetching(&self) -> bool {
        self.slot.read().state.is_fetching
    }

    /// True when nothing was ever received or the data has outlived the
    /// staleness window.
    pub fn is_stale(&self) -> bool {
        match self.slot.read().fetched_at {
            Some(at) => at.elapsed() >= self.policy.stale_time,
            None => true,
        }
    }

    /// Fetch now, superseding any request already in flight.
    pub async fn refetch(&self) -> FeedState<S::Output> {
        let generation = self.begin();
        self.run(generation).await
    }

    /// Fetch unless a request is already in flight; `None` when skipped.
    pub async fn refresh_if_idle(&self) -> Option<FeedState<S::Output>> {
        let Some(generation) = self.try_begin() else {
            debug!(feed = %self.kind(), "Fetch already in flight, skipping refresh");
            return None;
        };
        Some(self.run(generation).await)
    }

    fn begin(&self) -> u64 {
        let mut slot = self.slot.write();
        slot.issued += 1;
        slot.state.is_fetching = true;
        slot.issued
    }

    fn try_begin(&self) -> Option<u64> {
        let mut slot = self.slot.write();
        if slot.state.is_fetching {
            return None;
        }
        slot.issued += 1;
        slot.state.is_fetching = true;
        Some(slot.issued)
    }

    async fn run(&self, generation: u64) -> FeedState<S::Output> {
        let start = Instant::now();
        debug!(feed = %self.kind(), generation = generation, "Fetching feed");

        let result = self.source.fetch().await;
        self.settle(generation, result, start)
    }

    fn settle(
        &self,
        generation: u64,
        result: Result<S::Output, FeedError>,
        start: Instant,
    ) -> FeedState<S::Output> {
        let kind = self.kind();
        let mut slot = self.slot.write();

        if generation != slot.issued {
            debug!(
                feed = %kind,
                generation = generation,
                latest = slot.issued,
                "Discarding superseded response"
            );
            return slot.state.clone();
        }

        slot.state.is_fetching = false;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(data) => {
                info!(feed = %kind, elapsed_ms = elapsed_ms, "Feed refreshed");
                slot.state.status = FeedStatus::Success;
                slot.state.data = Some(Arc::new(data));
                slot.state.error = None;
                slot.state.data_updated_at = Some(Utc::now());
                slot.fetched_at = Some(Instant::now());
            }
            Err(err) => {
                warn!(
                    feed = %kind,
                    error = %err,
                    has_stale_data = slot.state.data.is_some(),
                    elapsed_ms = elapsed_ms,
                    "Feed refresh failed"
                );
                slot.state.status = FeedStatus::Error;
                slot.state.error = Some(err);
                slot.state.error_updated_at = Some(Utc::now());
            }
        }

        slot.state.clone()
    }
}

/// State of all three feeds at one instant
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub global: FeedState<GlobalMarketSnapshot>,
    pub top_coins: FeedState<Vec<MarketCoin>>,
    pub trending: FeedState<Vec<TrendingCoin>>,
}

impl DashboardSnapshot {
    pub fn is_fetching(&self) -> bool {
        self.global.is_fetching || self.top_coins.is_fetching || self.trending.is_fetching
    }

    /// The page is unavailable only when no feed has any data and at least
    /// one of them has failed.
    pub fn health(&self) -> DashboardHealth {
        let has_any_data =
            self.global.has_data() || self.top_coins.has_data() || self.trending.has_data();
        if has_any_data {
            return DashboardHealth::Ready;
        }

        let first_error = [
            self.global.blocking_error(),
            self.top_coins.blocking_error(),
            self.trending.blocking_error(),
        ]
        .into_iter()
        .flatten()
        .next();

        match first_error {
            Some(err) => DashboardHealth::Unavailable(err.clone()),
            None => DashboardHealth::Loading,
        }
    }
}

/// The three dashboard feeds
pub struct FeedCoordinator {
    pub global: Arc<PolledFeed<GlobalFeed>>,
    pub top_coins: Arc<PolledFeed<TopCoinsFeed>>,
    pub trending: Arc<PolledFeed<TrendingFeed>>,
}

impl FeedCoordinator {
    pub fn new(service: CoinGeckoService) -> Self {
        Self {
            global: Arc::new(PolledFeed::new(
                GlobalFeed(service.clone()),
                RefreshPolicy::GLOBAL,
            )),
            top_coins: Arc::new(PolledFeed::new(
                TopCoinsFeed(service.clone()),
                RefreshPolicy::TOP_COINS,
            )),
            trending: Arc::new(PolledFeed::new(
                TrendingFeed(service),
                RefreshPolicy::TRENDING,
            )),
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            global: self.global.state(),
            top_coins: self.top_coins.state(),
            trending: self.trending.state(),
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.global.is_fetching() || self.top_coins.is_fetching() || self.trending.is_fetching()
    }

    /// Refetch every feed concurrently and wait for all of them to settle.
    pub async fn refetch_all(&self) -> DashboardSnapshot {
        let (global, top_coins, trending) = tokio::join!(
            self.global.refetch(),
            self.top_coins.refetch(),
            self.trending.refetch(),
        );

        DashboardSnapshot {
            global,
            top_coins,
            trending,
        }
    }

    /// Start the background refresh loop of every feed.
    pub fn spawn_polling(&self) -> Vec<JoinHandle<()>> {
        start_feed_refresh_jobs(self)
    }

    /// Refetch only the feeds whose data is stale and which are not already
    /// fetching. Returns the feeds that were refreshed.
    pub async fn refresh_stale(&self) -> Vec<FeedKind> {
        let mut pending: Vec<BoxFuture<'_, Option<FeedKind>>> = Vec::new();

        if self.global.is_stale() {
            pending.push(refresh_kind(&*self.global));
        }
        if self.top_coins.is_stale() {
            pending.push(refresh_kind(&*self.top_coins));
        }
        if self.trending.is_stale() {
            pending.push(refresh_kind(&*self.trending));
        }

        join_all(pending).await.into_iter().flatten().collect()
    }
}

fn refresh_kind<S: FeedSource>(feed: &PolledFeed<S>) -> BoxFuture<'_, Option<FeedKind>> {
    async move { feed.refresh_if_idle().await.map(|_| feed.kind()) }.boxed()
}
