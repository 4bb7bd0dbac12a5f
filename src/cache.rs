use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::coingecko::MarketChartQuery;
use crate::error::FetchError;
use crate::model::PricePoint;

#[derive(Debug, Clone)]
struct CachedChart {
    points: Arc<Vec<PricePoint>>,
    fetched_at: Instant,
}

/// Reuses successful market chart fetches for `ttl`. Failures are not
/// stored, so the next page load queries the API again. Two concurrent
/// misses may both hit the network; the later write wins.
#[derive(Debug)]
pub struct FetchCache {
    ttl: Duration,
    entries: RwLock<HashMap<MarketChartQuery, CachedChart>>,
}

impl FetchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, query: &MarketChartQuery) -> Option<Arc<Vec<PricePoint>>> {
        if self.ttl.is_zero() {
            return None;
        }
        let entries = self.entries.read().await;
        entries
            .get(query)
            .filter(|c| c.fetched_at.elapsed() < self.ttl)
            .map(|c| Arc::clone(&c.points))
    }

    pub async fn insert(&self, query: MarketChartQuery, points: Arc<Vec<PricePoint>>) {
        if self.ttl.is_zero() {
            return;
        }
        let mut entries = self.entries.write().await;
        entries.insert(
            query,
            CachedChart {
                points,
                fetched_at: Instant::now(),
            },
        );
    }

    pub async fn get_or_fetch<F, Fut>(
        &self,
        query: &MarketChartQuery,
        fetch: F,
    ) -> Result<Arc<Vec<PricePoint>>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<PricePoint>, FetchError>>,
    {
        if let Some(points) = self.get(query).await {
            tracing::debug!(count = points.len(), "Market chart cache hit");
            return Ok(points);
        }
        tracing::debug!("Market chart cache miss");
        let points = Arc::new(fetch().await?);
        self.insert(query.clone(), Arc::clone(&points)).await;
        Ok(points)
    }
}
