use crate::engine::error::ModelError;
use crate::engine::predictor::rmse;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Grid resolution of the generalized-cross-validation search for the ridge
/// regularization strength.
const GCV_GRID_POINTS: usize = 100;

/// Convergence tolerance on the largest coordinate update per lasso sweep.
const LASSO_TOL: f64 = 1e-6;

/// The outcome of the ridge-regression importance ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeRanking {
    /// Fitted coefficient vector at the selected regularization.
    pub coefficients: DVector<f64>,
    /// Feature indices by descending |coefficient|, ties broken by index.
    pub order: Vec<usize>,
    /// Held-out RMSE of the linear model, the reference error for reduction.
    pub validation_rmse: f64,
    /// The GCV-selected squared regularization strength.
    pub regularization: f64,
}

/// Fits a ridge model with an automatically selected regularization strength
/// and ranks features by coefficient magnitude.
///
/// The strength is chosen by generalized cross-validation over a log-spaced
/// grid anchored at the design matrix's largest singular value.
pub fn ridge_rank(
    train: &DMatrix<f64>,
    target: &DVector<f64>,
    test: &DMatrix<f64>,
    test_target: &DVector<f64>,
) -> Result<RidgeRanking, ModelError> {
    let n = train.nrows();
    let d = train.ncols();

    let svd = train.clone().svd(true, true);
    let u = svd.u.as_ref().ok_or_else(|| instability("ridge", "SVD did not produce U"))?;
    let v_t = svd
        .v_t
        .as_ref()
        .ok_or_else(|| instability("ridge", "SVD did not produce V^T"))?;
    let s = &svd.singular_values;
    let s_max = s.max();
    if !(s_max > 0.0) || !s_max.is_finite() {
        return Err(instability("ridge", "design matrix has no finite spectrum"));
    }

    let uty = u.transpose() * target;

    // Log-spaced omega^2 grid spanning well below to above the spectrum.
    let lo = (s_max * s_max * 1e-10).ln();
    let hi = (s_max * s_max * 10.0).ln();
    let mut best = (f64::INFINITY, s_max * s_max * 1e-4);
    for g in 0..GCV_GRID_POINTS {
        let t = g as f64 / (GCV_GRID_POINTS - 1) as f64;
        let omega2 = (lo + t * (hi - lo)).exp();

        let mut fitted = DVector::zeros(n);
        let mut eff_df = 0.0;
        for k in 0..s.len() {
            let s2 = s[k] * s[k];
            let shrink = s2 / (s2 + omega2);
            eff_df += shrink;
            fitted += u.column(k) * (shrink * uty[k]);
        }
        let denom = n as f64 - eff_df;
        if denom < 1e-9 {
            continue;
        }
        let rss = (target - &fitted).norm_squared();
        let gcv = n as f64 * rss / (denom * denom);
        if gcv < best.0 {
            best = (gcv, omega2);
        }
    }
    let omega2 = best.1;
    debug!(omega2, "ridge regularization selected by GCV");

    let mut coefficients = DVector::zeros(d);
    for k in 0..s.len() {
        let factor = s[k] / (s[k] * s[k] + omega2);
        coefficients += v_t.row(k).transpose() * (factor * uty[k]);
    }
    if coefficients.iter().any(|v| !v.is_finite()) {
        return Err(instability("ridge", "non-finite coefficients"));
    }

    let order = magnitude_order(coefficients.as_slice());
    let validation_rmse = rmse(&(test * &coefficients), test_target);

    Ok(RidgeRanking {
        coefficients,
        order,
        validation_rmse,
        regularization: omega2,
    })
}

/// The outcome of a lasso regularization-path sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct LassoPath {
    /// Held-out RMSE at each path step, smallest regularization first.
    pub step_errors: Vec<f64>,
    /// The minimum of `step_errors`.
    pub min_error: f64,
    /// Active-set size at the minimum-error step.
    pub min_features: usize,
    /// Full feature ordering by descending path importance: features that
    /// survive to stronger regularization rank first.
    pub order: Vec<usize>,
}

/// Sweeps a lasso path over geometrically increasing regularization.
///
/// Fits by cyclic coordinate descent with warm starts, recording the active
/// set and held-out error at each step. The returned ordering ranks features
/// by how long they survive along the path, with coefficient magnitude at
/// the weakest regularization breaking ties.
pub fn lasso_path(
    train: &DMatrix<f64>,
    target: &DVector<f64>,
    test: &DMatrix<f64>,
    test_target: &DVector<f64>,
    steps: usize,
    max_iter: usize,
    initial_alpha: f64,
) -> Result<LassoPath, ModelError> {
    let n = train.nrows();
    let d = train.ncols();
    if d == 0 {
        return Ok(LassoPath {
            step_errors: Vec::new(),
            min_error: f64::INFINITY,
            min_features: 0,
            order: Vec::new(),
        });
    }

    let y_mean = target.sum() / n as f64;
    let yc = target.map(|v| v - y_mean);

    // The strength at which every coefficient vanishes; the sweep stops there.
    let alpha_max = (0..d)
        .map(|j| (train.column(j).dot(&yc) / n as f64).abs())
        .fold(0.0f64, f64::max)
        .max(initial_alpha * 2.0);

    let ratio = (alpha_max / initial_alpha).powf(1.0 / (steps - 1) as f64);
    let col_norms: Vec<f64> = (0..d).map(|j| train.column(j).norm_squared() / n as f64).collect();

    let mut beta = DVector::zeros(d);
    let mut residual = yc.clone();
    let mut step_errors = Vec::with_capacity(steps);
    let mut last_active: Vec<i64> = vec![-1; d];
    let mut first_beta: Option<DVector<f64>> = None;

    for step in 0..steps {
        let alpha = initial_alpha * ratio.powi(step as i32);

        for sweep in 0..max_iter {
            let mut max_delta = 0.0f64;
            for j in 0..d {
                if col_norms[j] <= 0.0 {
                    continue;
                }
                let old = beta[j];
                let rho = train.column(j).dot(&residual) / n as f64 + col_norms[j] * old;
                let new = soft_threshold(rho, alpha) / col_norms[j];
                if new != old {
                    residual -= train.column(j) * (new - old);
                    beta[j] = new;
                    max_delta = max_delta.max((new - old).abs());
                }
            }
            if max_delta < LASSO_TOL {
                break;
            }
            if sweep + 1 == max_iter {
                debug!(alpha, "lasso sweep budget exhausted before convergence");
            }
        }
        if beta.iter().any(|v| !v.is_finite()) {
            return Err(instability("lasso", "coordinate descent diverged"));
        }

        for j in 0..d {
            if beta[j] != 0.0 {
                last_active[j] = step as i64;
            }
        }
        if first_beta.is_none() {
            first_beta = Some(beta.clone());
        }

        let predictions = test * &beta + DVector::from_element(test.nrows(), y_mean);
        step_errors.push(rmse(&predictions, test_target));
    }

    let (min_step, min_error) = step_errors
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, &e)| (i, e))
        .unwrap_or((0, f64::INFINITY));
    let min_features = last_active.iter().filter(|&&s| s >= min_step as i64).count();

    let first_beta = first_beta.unwrap_or_else(|| DVector::zeros(d));
    let mut order: Vec<usize> = (0..d).collect();
    order.sort_by(|&a, &b| {
        last_active[b]
            .cmp(&last_active[a])
            .then(
                first_beta[b]
                    .abs()
                    .partial_cmp(&first_beta[a].abs())
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(a.cmp(&b))
    });

    Ok(LassoPath {
        step_errors,
        min_error,
        min_features,
        order,
    })
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

/// Indices ordered by descending absolute value, ties broken by index.
pub fn magnitude_order(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[b]
            .abs()
            .partial_cmp(&values[a].abs())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    order
}

fn instability(stage: &'static str, message: &str) -> ModelError {
    ModelError::NumericInstability {
        stage,
        message: message.to_string(),
    }
}
