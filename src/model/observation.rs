use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const FEATURE_DIM: usize = 3;

/// One raw `[epoch_ms, price]` pair from the market chart endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp_ms: i64,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp_ms: i64, price: f64) -> Self {
        Self {
            timestamp_ms,
            price,
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms)
    }
}

/// An hourly candle synthesized from a single price stream. High and low
/// are only the envelope of open and close; the feed has no intrahour range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Close of the following observation.
    pub target: f64,
}

impl Observation {
    pub fn features(&self) -> [f64; FEATURE_DIM] {
        [self.open, self.high, self.low]
    }

    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}

/// Build observations from raw points. The first point has no previous
/// price to open from and the last has no next close to target, so both are
/// dropped: `n` points yield `n - 2` observations.
pub fn observations_from_prices(points: &[PricePoint]) -> Vec<Observation> {
    if points.len() < 3 {
        return Vec::new();
    }
    points
        .windows(3)
        .filter_map(|w| {
            let (prev, cur, next) = (w[0], w[1], w[2]);
            let timestamp = cur.timestamp()?;
            let open = prev.price;
            let close = cur.price;
            Some(Observation {
                timestamp,
                price: cur.price,
                open,
                high: open.max(close),
                low: open.min(close),
                close,
                target: next.price,
            })
        })
        .collect()
}
