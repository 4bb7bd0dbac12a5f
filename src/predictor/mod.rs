use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::ModelConfig;
use crate::error::{FetchError, FitError, ForecastError};
use crate::model::{observations_from_prices, Observation, PricePoint, FEATURE_DIM};

pub mod linear;

pub use linear::{r_squared, test_size, train_test_split, LinearRegression, SplitIndices};

/// Fewer raw price points than this is reported like a failed fetch.
pub const MIN_RAW_POINTS: usize = 10;
/// Training needs strictly more usable rows than this.
pub const MIN_TRAINING_ROWS_EXCLUSIVE: usize = 6;
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub observations: Vec<Observation>,
    /// R² on the hold-out rows; shown to users as "accuracy".
    pub r2: f64,
    pub next_close: f64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub intercept: f64,
    pub coefficients: [f64; FEATURE_DIM],
}

impl Forecast {
    pub fn latest(&self, n: usize) -> &[Observation] {
        let start = self.observations.len().saturating_sub(n);
        &self.observations[start..]
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.observations.last().map(|o| o.timestamp)
    }
}

/// Fetched → transformed → guarded → trained → predicted, stopping at the
/// first failure.
#[derive(Debug, Clone)]
pub struct Forecaster {
    test_fraction: f64,
    split_seed: Option<u64>,
}

impl Default for Forecaster {
    fn default() -> Self {
        Self::new(DEFAULT_TEST_FRACTION, None)
    }
}

impl Forecaster {
    pub fn new(test_fraction: f64, split_seed: Option<u64>) -> Self {
        Self {
            test_fraction,
            split_seed,
        }
    }

    pub fn from_config(cfg: &ModelConfig) -> Self {
        Self::new(cfg.test_fraction, cfg.split_seed)
    }

    pub fn run(&self, fetched: Result<&[PricePoint], FetchError>) -> Result<Forecast, ForecastError> {
        let points = match fetched {
            Ok(points) => points,
            Err(e) => {
                tracing::warn!(error = %e, "Market chart fetch failed");
                return Err(ForecastError::Fetch(e));
            }
        };

        check_raw_points(points)?;
        let observations = observations_from_prices(points);
        check_training_rows(&observations)?;

        let xs: Vec<[f64; FEATURE_DIM]> = observations.iter().map(Observation::features).collect();
        let ys: Vec<f64> = observations.iter().map(|o| o.target).collect();

        let split = match self.split_seed {
            Some(seed) => {
                train_test_split(xs.len(), self.test_fraction, &mut StdRng::seed_from_u64(seed))
            }
            None => train_test_split(xs.len(), self.test_fraction, &mut rand::thread_rng()),
        };
        let (train_x, train_y) = gather(&xs, &ys, &split.train);
        let (test_x, test_y) = gather(&xs, &ys, &split.test);

        let model = LinearRegression::fit(&train_x, &train_y)?;
        let r2 = model.score(&test_x, &test_y).ok_or(FitError::Empty)?;

        let last = observations.last().ok_or(FitError::Empty)?;
        let next_close = model.predict(&last.features());
        if !next_close.is_finite() || !r2.is_finite() {
            return Err(FitError::NonFinite.into());
        }

        tracing::info!(
            usable = observations.len(),
            train_rows = train_x.len(),
            test_rows = test_x.len(),
            rank = model.rank(),
            r2,
            next_close,
            "Fitted next-close regression"
        );

        Ok(Forecast {
            r2,
            next_close,
            train_rows: train_x.len(),
            test_rows: test_x.len(),
            intercept: model.intercept(),
            coefficients: model.coefficients(),
            observations,
        })
    }
}

/// Guard before transforming: short series are treated like a failed fetch.
pub fn check_raw_points(points: &[PricePoint]) -> Result<(), ForecastError> {
    if points.len() < MIN_RAW_POINTS {
        tracing::warn!(
            got = points.len(),
            required = MIN_RAW_POINTS,
            "Too few raw price points"
        );
        return Err(ForecastError::InsufficientRawData {
            got: points.len(),
            required: MIN_RAW_POINTS,
        });
    }
    Ok(())
}

/// Guard before training: needs more than `MIN_TRAINING_ROWS_EXCLUSIVE` rows.
pub fn check_training_rows(observations: &[Observation]) -> Result<(), ForecastError> {
    if observations.len() <= MIN_TRAINING_ROWS_EXCLUSIVE {
        tracing::warn!(
            usable = observations.len(),
            required = MIN_TRAINING_ROWS_EXCLUSIVE,
            "Too few usable rows to train"
        );
        return Err(ForecastError::InsufficientTrainingData {
            usable: observations.len(),
            required: MIN_TRAINING_ROWS_EXCLUSIVE,
        });
    }
    Ok(())
}

fn gather(
    xs: &[[f64; FEATURE_DIM]],
    ys: &[f64],
    idx: &[usize],
) -> (Vec<[f64; FEATURE_DIM]>, Vec<f64>) {
    idx.iter().map(|&i| (xs[i], ys[i])).unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hourly(prices: &[f64]) -> Vec<PricePoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| PricePoint::new(1_700_000_000_000 + i as i64 * 3_600_000, *p))
            .collect()
    }

    #[test]
    fn latest_returns_tail() {
        let points = hourly(&(0..15).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        let forecast = Forecaster::new(0.2, Some(1)).run(Ok(points.as_slice())).unwrap();
        assert_eq!(forecast.latest(5).len(), 5);
        assert_eq!(forecast.latest(100).len(), 13);
        assert_eq!(
            forecast.last_timestamp(),
            forecast.observations.last().map(|o| o.timestamp)
        );
    }

    #[test]
    fn seeded_runs_agree() {
        let points = hourly(&[
            100.0, 102.0, 101.0, 105.0, 104.0, 108.0, 107.0, 111.0, 110.0, 114.0, 113.0, 117.0,
            116.0, 120.0,
        ]);
        let f = Forecaster::new(0.2, Some(99));
        let a = f.run(Ok(points.as_slice())).unwrap();
        let b = f.run(Ok(points.as_slice())).unwrap();
        assert_eq!(a.r2, b.r2);
        assert_eq!(a.next_close, b.next_close);
    }
}
