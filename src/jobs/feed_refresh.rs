//! Feed Refresh Job
//!
//! One background loop per feed, each on the feed's own refresh interval.
//! A tick is skipped when the feed already has a request in flight.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::services::feed_coordinator::{FeedCoordinator, FeedSource, PolledFeed};

/// Start background refresh for all three feeds
pub fn start_feed_refresh_jobs(coordinator: &FeedCoordinator) -> Vec<JoinHandle<()>> {
    vec![
        start_feed_refresh_job(Arc::clone(&coordinator.global)),
        start_feed_refresh_job(Arc::clone(&coordinator.top_coins)),
        start_feed_refresh_job(Arc::clone(&coordinator.trending)),
    ]
}

/// Spawns the refresh loop for one feed.
///
/// Runs immediately when the feed has no fresh data, then on every tick of
/// the feed's refresh interval.
pub fn start_feed_refresh_job<S: FeedSource>(feed: Arc<PolledFeed<S>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let every = feed.policy().refresh_interval;
        info!(
            feed = %feed.kind(),
            refresh_interval_secs = every.as_secs(),
            "Starting feed refresh job"
        );

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;

        if feed.is_stale() {
            feed.refresh_if_idle().await;
        }

        loop {
            ticker.tick().await;
            debug!(feed = %feed.kind(), "Scheduled feed refresh");
            feed.refresh_if_idle().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use crate::models::feed::{FeedKind, FeedStatus};
    use crate::services::feed_coordinator::RefreshPolicy;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingSource(AtomicUsize);

    #[async_trait]
    impl FeedSource for CountingSource {
        type Output = usize;

        fn kind(&self) -> FeedKind {
            FeedKind::Trending
        }

        async fn fetch(&self) -> Result<usize, FeedError> {
            Ok(self.0.fetch_add(1, Ordering::SeqCst))
        }
    }

    #[tokio::test]
    async fn test_job_fetches_on_start_and_on_interval() {
        let policy = RefreshPolicy {
            stale_time: Duration::from_millis(5),
            refresh_interval: Duration::from_millis(40),
        };
        let feed = Arc::new(PolledFeed::new(CountingSource(AtomicUsize::new(0)), policy));

        let handle = start_feed_refresh_job(Arc::clone(&feed));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(feed.state().status, FeedStatus::Success);
        assert_eq!(feed.state().data.as_deref(), Some(&0));

        tokio::time::sleep(Duration::from_millis(60)).await;
        let latest = feed.state().data.as_deref().copied().unwrap();
        assert!(latest >= 1);

        handle.abort();
    }
}
