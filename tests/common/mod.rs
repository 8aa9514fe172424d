#![allow(dead_code)]

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header},
    response::IntoResponse,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crypto_dashboard::config::Settings;

pub const GLOBAL_PATH: &str = "/global";
pub const MARKETS_PATH: &str = "/coins/markets";
pub const TRENDING_PATH: &str = "/search/trending";

/// Canned reply for one upstream route
#[derive(Clone)]
pub struct MockResponse {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl MockResponse {
    pub fn json(value: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: value.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn raw(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn server_error() -> Self {
        Self::raw(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"boom"}"#)
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A recorded upstream request
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
}

#[derive(Clone, Default)]
struct MockState {
    routes: Arc<Mutex<HashMap<&'static str, MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Mock CoinGecko API on an ephemeral local port, mounted under `/api/v3`
pub struct MockCoinGecko {
    pub base_url: String,
    state: MockState,
}

impl MockCoinGecko {
    /// Starts with healthy fixtures on every route.
    pub async fn start() -> Self {
        let state = MockState::default();
        {
            let mut routes = state.routes.lock();
            routes.insert(GLOBAL_PATH, MockResponse::json(global_fixture()));
            routes.insert(MARKETS_PATH, MockResponse::json(markets_fixture()));
            routes.insert(TRENDING_PATH, MockResponse::json(trending_fixture()));
        }

        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("Mock server has no address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock server failed");
        });

        Self {
            base_url: format!("http://{}/api/v3", addr),
            state,
        }
    }

    pub fn respond(&self, path: &'static str, response: MockResponse) {
        self.state.routes.lock().insert(path, response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state
            .requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    pub fn settings(&self) -> Settings {
        Settings::with_base_url(&self.base_url).expect("Mock base URL should parse")
    }
}

async fn handle(State(state): State<MockState>, uri: Uri, headers: HeaderMap) -> impl IntoResponse {
    let path = uri
        .path()
        .strip_prefix("/api/v3")
        .unwrap_or(uri.path())
        .to_string();

    state.requests.lock().push(RecordedRequest {
        path: path.clone(),
        query: uri.query().map(str::to_string),
        headers,
    });

    let response = state.routes.lock().get(path.as_str()).cloned();
    match response {
        Some(response) => {
            if !response.delay.is_zero() {
                tokio::time::sleep(response.delay).await;
            }
            (
                response.status,
                [(header::CONTENT_TYPE, "application/json")],
                response.body,
            )
        }
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"error":"not found"}"#.to_string(),
        ),
    }
}

pub fn global_fixture() -> Value {
    json!({
        "data": {
            "active_cryptocurrencies": 14012,
            "upcoming_icos": 0,
            "markets": 1187,
            "total_market_cap": { "usd": 2480000000000.0, "eur": 2290000000000.0 },
            "total_volume": { "usd": 95500000000.0, "eur": 88100000000.0 },
            "market_cap_percentage": {
                "btc": 54.2,
                "eth": 16.8,
                "usdt": 4.1,
                "bnb": 3.6,
                "sol": 3.1
            },
            "market_cap_change_percentage_24h_usd": -1.37,
            "updated_at": 1700000000
        }
    })
}

fn market_coin(id: &str, symbol: &str, rank: u32, price: f64, change_24h: Value) -> Value {
    json!({
        "id": id,
        "symbol": symbol,
        "name": id[..1].to_uppercase() + &id[1..],
        "image": format!("https://assets.example/{}.png", symbol),
        "current_price": price,
        "market_cap": price * 1_000_000.0,
        "market_cap_rank": rank,
        "total_volume": price * 10_000.0,
        "price_change_percentage_24h": change_24h,
        "price_change_percentage_7d_in_currency": 2.5,
        "sparkline_in_7d": { "price": [price * 0.98, price * 1.01, price] }
    })
}

pub fn markets_fixture() -> Value {
    json!([
        market_coin("bitcoin", "btc", 1, 64000.0, json!(1.2)),
        market_coin("ethereum", "eth", 2, 3400.0, json!(-0.8)),
        market_coin("solana", "sol", 5, 145.0, json!(null)),
    ])
}

pub fn trending_fixture() -> Value {
    json!({
        "coins": [
            {
                "item": {
                    "id": "pepe",
                    "name": "Pepe",
                    "symbol": "PEPE",
                    "market_cap_rank": 27,
                    "thumb": "https://assets.example/pepe.png",
                    "score": 1,
                    "price_btc": 0.00000002,
                    "data": {
                        "price": "$0.0031",
                        "price_change_percentage_24h": { "usd": "n/a" }
                    }
                }
            },
            {
                "item": {
                    "id": "bonk",
                    "name": "Bonk",
                    "symbol": "BONK",
                    "market_cap_rank": null,
                    "thumb": "https://assets.example/bonk.png",
                    "score": 0,
                    "price_btc": 0.0000004,
                    "data": {
                        "price": 0.0248,
                        "price_change_percentage_24h": { "usd": 12.5 }
                    }
                }
            }
        ],
        "nfts": [],
        "categories": []
    })
}
