use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::FetchCache;
use crate::coingecko::{CoinGeckoClient, MarketChartQuery};
use crate::config::Config;
use crate::error::ForecastError;
use crate::model::Observation;
use crate::predictor::{Forecast, Forecaster};
use crate::ui::DashboardPage;

/// Shared by every handler through `axum::extract::State`.
pub struct AppState {
    pub client: CoinGeckoClient,
    pub cache: FetchCache,
    pub forecaster: Forecaster,
    pub table_rows: usize,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Arc<Self>> {
        let client = CoinGeckoClient::new(&config.coingecko.base_url, config.coingecko.timeout())?;
        Ok(Arc::new(Self {
            client,
            cache: FetchCache::new(config.cache.ttl()),
            forecaster: Forecaster::from_config(&config.model),
            table_rows: config.ui.table_rows,
        }))
    }

    /// One render cycle: fetch (possibly cached) and run the forecast.
    pub async fn forecast(&self) -> Result<Forecast, ForecastError> {
        let query = MarketChartQuery::default();
        let fetched = self
            .cache
            .get_or_fetch(&query, || self.client.fetch_market_chart(&query))
            .await;
        match fetched {
            Ok(points) => self.forecaster.run(Ok(points.as_slice())),
            Err(e) => self.forecaster.run(Err(e)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ForecastSummary<'a> {
    pub r2: f64,
    pub next_close: f64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub usable_rows: usize,
    pub last_timestamp: Option<DateTime<Utc>>,
    pub latest: &'a [Observation],
}

impl<'a> ForecastSummary<'a> {
    pub fn new(forecast: &'a Forecast, rows: usize) -> Self {
        Self {
            r2: forecast.r2,
            next_close: forecast.next_close,
            train_rows: forecast.train_rows,
            test_rows: forecast.test_rows,
            usable_rows: forecast.observations.len(),
            last_timestamp: forecast.last_timestamp(),
            latest: forecast.latest(rows),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/api/forecast", get(api_forecast))
        .route("/health", get(health))
        .with_state(state)
}

async fn dashboard(State(state): State<Arc<AppState>>) -> Response {
    let started = Instant::now();
    let outcome = state.forecast().await;
    let rendered = DashboardPage::new(&outcome)
        .table_rows(state.table_rows)
        .render();
    match rendered {
        Ok(html) => {
            tracing::info!(
                ok = outcome.is_ok(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Dashboard rendered"
            );
            Html(html).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Dashboard render failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to render dashboard",
            )
                .into_response()
        }
    }
}

async fn api_forecast(State(state): State<Arc<AppState>>) -> Response {
    match state.forecast().await {
        Ok(forecast) => Json(ForecastSummary::new(&forecast, state.table_rows)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
