use serde::Deserialize;

use crate::error::FetchError;
use crate::model::PricePoint;

pub const COIN_ID: &str = "bitcoin";
pub const VS_CURRENCY: &str = "usd";
pub const DAYS: &str = "1";
pub const INTERVAL: &str = "hourly";

/// Parameters of a market chart request. The dashboard only ever asks for
/// one day of hourly BTC/USD, but the query doubles as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarketChartQuery {
    pub coin_id: &'static str,
    pub vs_currency: &'static str,
    pub days: &'static str,
    pub interval: &'static str,
}

impl Default for MarketChartQuery {
    fn default() -> Self {
        Self {
            coin_id: COIN_ID,
            vs_currency: VS_CURRENCY,
            days: DAYS,
            interval: INTERVAL,
        }
    }
}

impl MarketChartQuery {
    pub fn path(&self) -> String {
        format!("coins/{}/market_chart", self.coin_id)
    }

    pub fn params(&self) -> [(&'static str, &'static str); 3] {
        [
            ("vs_currency", self.vs_currency),
            ("days", self.days),
            ("interval", self.interval),
        ]
    }
}

/// `prices` is a list of `[epoch_ms, price]`; the other series the endpoint
/// returns (market caps, volumes) are ignored.
#[derive(Debug, Deserialize)]
pub struct MarketChartResponse {
    pub prices: Vec<(f64, f64)>,
}

impl MarketChartResponse {
    pub fn into_price_points(self) -> Result<Vec<PricePoint>, FetchError> {
        self.prices
            .into_iter()
            .enumerate()
            .map(|(i, (ts, price))| {
                if !ts.is_finite() || !price.is_finite() {
                    return Err(FetchError::Payload(format!(
                        "non-finite value in prices[{}]",
                        i
                    )));
                }
                let point = PricePoint::new(ts as i64, price);
                if point.timestamp().is_none() {
                    return Err(FetchError::Payload(format!(
                        "timestamp out of range in prices[{}]: {}",
                        i, ts
                    )));
                }
                Ok(point)
            })
            .collect()
    }
}
