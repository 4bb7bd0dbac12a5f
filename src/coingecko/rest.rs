use anyhow::{Context, Result};
use std::time::{Duration, Instant};

use crate::error::FetchError;
use crate::model::PricePoint;

use super::types::{MarketChartQuery, MarketChartResponse};

pub struct CoinGeckoClient {
    http: reqwest::Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("btc-forecast/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build CoinGecko HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn market_chart_url(&self, query: &MarketChartQuery) -> Result<url::Url, FetchError> {
        let raw = format!("{}/{}", self.base_url, query.path());
        url::Url::parse_with_params(&raw, query.params())
            .map_err(|e| FetchError::Payload(format!("invalid request URL {}: {}", raw, e)))
    }

    fn compact_error_body(body: &str) -> String {
        let normalized = body.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.chars().count() > 180 {
            let cut: String = normalized.chars().take(180).collect();
            format!("{}...", cut)
        } else {
            normalized
        }
    }

    /// One GET against the market chart endpoint. No retries.
    pub async fn fetch_market_chart(
        &self,
        query: &MarketChartQuery,
    ) -> Result<Vec<PricePoint>, FetchError> {
        let url = self.market_chart_url(query)?;
        let started = Instant::now();
        tracing::debug!(url = %url, "Requesting market chart");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Market chart request rejected");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: Self::compact_error_body(&body),
            });
        }

        let body = resp.text().await?;
        let parsed: MarketChartResponse = serde_json::from_str(&body)?;
        let points = parsed.into_price_points()?;
        tracing::info!(
            coin = query.coin_id,
            vs_currency = query.vs_currency,
            count = points.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched market chart"
        );
        Ok(points)
    }
}
