#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

use btc_forecast::model::PricePoint;

pub const START_MS: i64 = 1_700_000_000_000;
pub const HOUR_MS: i64 = 3_600_000;

pub fn hourly_points(prices: &[f64]) -> Vec<PricePoint> {
    prices
        .iter()
        .enumerate()
        .map(|(i, p)| PricePoint::new(START_MS + i as i64 * HOUR_MS, *p))
        .collect()
}

pub fn increasing_prices(n: usize) -> Vec<f64> {
    (0..n).map(|i| 37_000.0 + 25.0 * i as f64).collect()
}

pub fn market_chart_body(prices: &[f64]) -> String {
    let pairs: Vec<serde_json::Value> = prices
        .iter()
        .enumerate()
        .map(|(i, p)| serde_json::json!([START_MS + i as i64 * HOUR_MS, p]))
        .collect();
    serde_json::json!({
        "prices": pairs,
        "market_caps": [],
        "total_volumes": [],
    })
    .to_string()
}

/// Local stand-in for the CoinGecko market chart endpoint. Returns the
/// `/api/v3` base URL and a counter of requests served.
pub struct MockCoinGecko {
    pub base_url: String,
    pub hits: Arc<AtomicUsize>,
}

impl MockCoinGecko {
    pub async fn start(status: StatusCode, body: String) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let app = Router::new().route(
            "/api/v3/coins/bitcoin/market_chart",
            get(move |Query(params): Query<HashMap<String, String>>| {
                let counter = Arc::clone(&counter);
                let body = body.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let expected = params.get("vs_currency").map(String::as_str) == Some("usd")
                        && params.get("days").map(String::as_str) == Some("1")
                        && params.get("interval").map(String::as_str) == Some("hourly");
                    if !expected {
                        return (StatusCode::BAD_REQUEST, "unexpected query".to_string());
                    }
                    (status, body)
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://{}/api/v3", addr),
            hits,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// A base URL nothing listens on.
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/v3", addr)
}
