// src/lib.rs

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};

use config::Settings;
use error::FeedError;
use services::{
    coingecko::CoinGeckoService,
    dashboard::{DashboardView, build_dashboard_view},
    feed_coordinator::FeedCoordinator,
    preferences::{PreferenceStore, ViewPreferencesStore},
};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<FeedCoordinator>,
    pub preferences: Arc<Mutex<ViewPreferencesStore>>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Result<Self, FeedError> {
        let coingecko = CoinGeckoService::new(settings)?;
        let store = PreferenceStore::open_dir(&settings.prefs_dir);

        Ok(Self::with_parts(
            FeedCoordinator::new(coingecko),
            ViewPreferencesStore::open(&store),
        ))
    }

    pub fn with_parts(coordinator: FeedCoordinator, preferences: ViewPreferencesStore) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            preferences: Arc::new(Mutex::new(preferences)),
        }
    }

    /// Current dashboard built from the latest feed states and preferences
    pub fn view(&self) -> DashboardView {
        let prefs = self.preferences.lock().preferences();
        build_dashboard_view(&self.coordinator.snapshot(), &prefs)
    }

    /// Every `every`, refreshes stale feeds and hands the new view to
    /// `render`, until `shutdown` completes. Shutdown also interrupts a
    /// refresh that is still waiting on the upstream.
    pub async fn run_until<F, R>(&self, every: Duration, shutdown: F, mut render: R)
    where
        F: Future<Output = ()>,
        R: FnMut(&DashboardView),
    {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;

        tokio::pin!(shutdown);

        loop {
            let cycle = async {
                ticker.tick().await;
                self.coordinator.refresh_stale().await
            };

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutting down");
                    return;
                }
                refreshed = cycle => {
                    if !refreshed.is_empty() {
                        tracing::debug!(feeds = ?refreshed, "Refreshed stale feeds before render");
                    }
                    render(&self.view());
                }
            }
        }
    }
}

pub mod config;
pub mod error;
pub mod jobs;

pub mod models {
    pub mod feed;
    pub mod market;
    pub mod preferences;
    pub mod views;
}

pub mod services {
    pub mod coingecko;
    pub mod dashboard;
    pub mod feed_coordinator;
    pub mod formatters;
    pub mod preferences;
    pub mod schema;
    pub mod views;
}
