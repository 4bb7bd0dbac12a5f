use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::FitError;
use crate::model::FEATURE_DIM;

const JACOBI_MAX_SWEEPS: usize = 64;
/// Eigenvalues below this fraction of the largest are treated as zero.
const RANK_TOLERANCE: f64 = 1e-10;

/// Ordinary least squares with an intercept.
///
/// The normal equations are solved on centred data through an eigen
/// decomposition of `X'X`, dropping null directions. Collinear features
/// (monotonic prices make `low == open` on every row) therefore still give
/// the minimum-norm least-squares solution instead of a singular solve.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegression {
    coefficients: [f64; FEATURE_DIM],
    intercept: f64,
    rank: usize,
}

impl LinearRegression {
    pub fn fit(xs: &[[f64; FEATURE_DIM]], ys: &[f64]) -> Result<Self, FitError> {
        if xs.len() != ys.len() {
            return Err(FitError::LengthMismatch {
                rows: xs.len(),
                targets: ys.len(),
            });
        }
        if xs.is_empty() {
            return Err(FitError::Empty);
        }
        if ys.iter().any(|y| !y.is_finite()) || xs.iter().flatten().any(|x| !x.is_finite()) {
            return Err(FitError::NonFinite);
        }

        let n = xs.len() as f64;
        let mut mean_x = [0.0; FEATURE_DIM];
        for row in xs {
            for j in 0..FEATURE_DIM {
                mean_x[j] += row[j];
            }
        }
        for m in &mut mean_x {
            *m /= n;
        }
        let mean_y = ys.iter().sum::<f64>() / n;

        let mut xtx = [[0.0; FEATURE_DIM]; FEATURE_DIM];
        let mut xty = [0.0; FEATURE_DIM];
        for (row, y) in xs.iter().zip(ys) {
            let mut c = [0.0; FEATURE_DIM];
            for j in 0..FEATURE_DIM {
                c[j] = row[j] - mean_x[j];
            }
            let dy = y - mean_y;
            for i in 0..FEATURE_DIM {
                xty[i] += c[i] * dy;
                for j in 0..FEATURE_DIM {
                    xtx[i][j] += c[i] * c[j];
                }
            }
        }

        let (eigenvalues, eigenvectors) = symmetric_eigen(xtx);
        let lambda_max = eigenvalues.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let cutoff = lambda_max * RANK_TOLERANCE;

        let mut coefficients = [0.0; FEATURE_DIM];
        let mut rank = 0;
        for k in 0..FEATURE_DIM {
            let lambda = eigenvalues[k];
            if lambda_max <= 0.0 || lambda <= cutoff {
                continue;
            }
            rank += 1;
            let proj = (0..FEATURE_DIM)
                .map(|i| eigenvectors[i][k] * xty[i])
                .sum::<f64>()
                / lambda;
            for i in 0..FEATURE_DIM {
                coefficients[i] += proj * eigenvectors[i][k];
            }
        }

        let intercept = mean_y - dot(&coefficients, &mean_x);
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(FitError::NonFinite);
        }
        Ok(Self {
            coefficients,
            intercept,
            rank,
        })
    }

    pub fn coefficients(&self) -> [f64; FEATURE_DIM] {
        self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Number of feature directions the fit could resolve.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn predict(&self, x: &[f64; FEATURE_DIM]) -> f64 {
        self.intercept + dot(&self.coefficients, x)
    }

    /// Coefficient of determination on the given sample. `None` when empty.
    pub fn score(&self, xs: &[[f64; FEATURE_DIM]], ys: &[f64]) -> Option<f64> {
        let preds: Vec<f64> = xs.iter().map(|x| self.predict(x)).collect();
        r_squared(ys, &preds)
    }
}

/// R² of predictions against truth. A constant target scores 1.0 when
/// predicted exactly and 0.0 otherwise; any other score may be negative.
pub fn r_squared(y_true: &[f64], y_pred: &[f64]) -> Option<f64> {
    let n = y_true.len().min(y_pred.len());
    if n == 0 {
        return None;
    }
    let mean_y = y_true[..n].iter().sum::<f64>() / n as f64;
    let mut sse = 0.0;
    let mut sst = 0.0;
    for (y, yhat) in y_true.iter().zip(y_pred) {
        let err = y - yhat;
        sse += err * err;
        let d = y - mean_y;
        sst += d * d;
    }
    if sst <= 1e-18 {
        return Some(if sse <= 1e-18 { 1.0 } else { 0.0 });
    }
    Some(1.0 - (sse / sst))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Hold-out size for `n` rows: `ceil(n * fraction)`, kept within `1..n`
/// so neither side is empty once there are two rows.
pub fn test_size(n: usize, test_fraction: f64) -> usize {
    if n < 2 {
        return 0;
    }
    let raw = (n as f64 * test_fraction).ceil();
    (raw.max(0.0) as usize).clamp(1, n - 1)
}

pub fn train_test_split<R: Rng + ?Sized>(
    n: usize,
    test_fraction: f64,
    rng: &mut R,
) -> SplitIndices {
    let mut idx: Vec<usize> = (0..n).collect();
    idx.shuffle(rng);
    let n_test = test_size(n, test_fraction);
    let test = idx.split_off(n - n_test);
    SplitIndices { train: idx, test }
}

fn dot(a: &[f64; FEATURE_DIM], b: &[f64; FEATURE_DIM]) -> f64 {
    let mut s = 0.0;
    for i in 0..FEATURE_DIM {
        s += a[i] * b[i];
    }
    s
}

/// Cyclic Jacobi rotations. Returns eigenvalues and the eigenvectors as
/// columns of the second matrix.
fn symmetric_eigen(
    mut a: [[f64; FEATURE_DIM]; FEATURE_DIM],
) -> ([f64; FEATURE_DIM], [[f64; FEATURE_DIM]; FEATURE_DIM]) {
    let mut v = [[0.0; FEATURE_DIM]; FEATURE_DIM];
    for (i, row) in v.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    for _ in 0..JACOBI_MAX_SWEEPS {
        let mut off = 0.0;
        let mut diag = 0.0;
        for p in 0..FEATURE_DIM {
            diag += a[p][p] * a[p][p];
            for q in (p + 1)..FEATURE_DIM {
                off += a[p][q] * a[p][q];
            }
        }
        if off <= f64::EPSILON * f64::EPSILON * diag || off == 0.0 {
            break;
        }

        for p in 0..FEATURE_DIM {
            for q in (p + 1)..FEATURE_DIM {
                let apq = a[p][q];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..FEATURE_DIM {
                    let akp = a[k][p];
                    let akq = a[k][q];
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..FEATURE_DIM {
                    let apk = a[p][k];
                    let aqk = a[q][k];
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let vkp = row[p];
                    let vkq = row[q];
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let mut eigenvalues = [0.0; FEATURE_DIM];
    for i in 0..FEATURE_DIM {
        eigenvalues[i] = a[i][i];
    }
    (eigenvalues, v)
}
