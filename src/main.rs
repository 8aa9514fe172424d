use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crypto_dashboard::AppState;
use crypto_dashboard::config::Settings;
use crypto_dashboard::models::preferences::{SortDirection, SortKey, TrendFilter};
use crypto_dashboard::services::dashboard::render_text;

/// Headless crypto market dashboard
#[derive(Debug, Parser)]
#[command(name = "crypto-dashboard", version, about)]
struct Cli {
    /// Coin table search term (empty string clears it)
    #[arg(long)]
    search: Option<String>,

    /// all, gainers or losers
    #[arg(long)]
    filter: Option<TrendFilter>,

    /// market_cap_rank, current_price, price_change_24h, price_change_7d,
    /// market_cap or total_volume
    #[arg(long)]
    sort: Option<SortKey>,

    /// asc or desc
    #[arg(long, conflicts_with = "toggle_direction")]
    direction: Option<SortDirection>,

    /// Flip the saved sort direction
    #[arg(long)]
    toggle_direction: bool,

    /// Restore default preferences before applying other flags
    #[arg(long)]
    reset: bool,

    /// Render once and exit instead of polling
    #[arg(long)]
    once: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,crypto_dashboard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::from_env().context("invalid dashboard configuration")?;
    tracing::info!(base_url = %settings.base_url, "Starting crypto dashboard");

    let state = AppState::new(&settings).context("failed to build CoinGecko client")?;
    apply_preference_flags(&state, &cli);

    state.coordinator.refetch_all().await;
    println!("{}", render_text(&state.view()));

    if cli.once {
        return Ok(());
    }

    let jobs = state.coordinator.spawn_polling();

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for ctrl-c, stopping");
        }
    };
    state
        .run_until(settings.render_interval, shutdown, |view| {
            println!("{}", render_text(view))
        })
        .await;

    for job in jobs {
        job.abort();
    }

    Ok(())
}

fn apply_preference_flags(state: &AppState, cli: &Cli) {
    let mut prefs = state.preferences.lock();

    if cli.reset {
        prefs.reset();
    }
    if let Some(search) = &cli.search {
        prefs.set_search_term(search.clone());
    }
    if let Some(filter) = cli.filter {
        prefs.set_trend_filter(filter);
    }
    if let Some(sort) = cli.sort {
        prefs.set_sort_key(sort);
    }
    if let Some(direction) = cli.direction {
        prefs.set_sort_direction(direction);
    }
    if cli.toggle_direction {
        prefs.toggle_sort_direction();
    }
}
