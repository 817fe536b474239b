use crate::engine::error::ModelError;
use crate::engine::predictor::{gaussian_kernel, resolve_widths};
use argmin::core::{CostFunction, Error, Executor, State};
use argmin::solver::neldermead::NelderMead;
use nalgebra::{Cholesky, DMatrix, DVector};
use tracing::debug;

/// Lower bound on every tuned hyperparameter. A zero bandwidth or zero noise
/// makes the kernel system singular, so the optimizer is never allowed there.
pub const HYPER_FLOOR: f64 = 1e-9;

/// Objective value substituted when the kernel system cannot be factorized,
/// steering the simplex away from degenerate parameter regions.
const DEGENERATE_COST: f64 = 1e32;

const MAX_ITERS: u64 = 500;

/// Optimized kernel hyperparameters: one bandwidth per feature plus the
/// noise level, reported separately.
#[derive(Debug, Clone, PartialEq)]
pub struct TunedHyperparameters {
    pub widths: Vec<f64>,
    pub noise: f64,
}

/// The negative log marginal likelihood of the training data under a
/// Gaussian kernel with the given bandwidths and noise.
///
/// Parameters are floored at [`HYPER_FLOOR`] before evaluation; a failed
/// Cholesky factorization scores [`DEGENERATE_COST`] instead of aborting the
/// search.
pub fn negative_log_likelihood(
    train: &DMatrix<f64>,
    target: &DVector<f64>,
    widths: &[f64],
    noise: f64,
) -> f64 {
    let n = train.nrows();
    let widths: Vec<f64> = widths.iter().map(|w| w.max(HYPER_FLOOR)).collect();
    let noise = noise.max(HYPER_FLOOR);

    let mut k = gaussian_kernel(train, train, &widths);
    for i in 0..n {
        k[(i, i)] += noise;
    }

    let Some(chol) = Cholesky::new(k) else {
        return DEGENERATE_COST;
    };
    let alpha = chol.solve(target);
    let l = chol.l();
    let log_det: f64 = (0..n).map(|i| l[(i, i)].ln()).sum();

    0.5 * target.dot(&alpha)
        + log_det
        + 0.5 * n as f64 * (2.0 * std::f64::consts::PI).ln()
}

struct LikelihoodObjective<'a> {
    train: &'a DMatrix<f64>,
    target: &'a DVector<f64>,
}

impl CostFunction for LikelihoodObjective<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let (widths, noise) = split_theta(theta);
        Ok(negative_log_likelihood(self.train, self.target, widths, noise))
    }
}

fn split_theta(theta: &[f64]) -> (&[f64], f64) {
    let (noise, widths) = theta.split_last().expect("theta holds widths plus noise");
    (widths, *noise)
}

/// Minimizes the negative log marginal likelihood over one bandwidth per
/// feature plus the noise level.
///
/// The search runs a derivative-free Nelder-Mead simplex seeded at the
/// starting values; every returned parameter is floored at [`HYPER_FLOOR`].
pub fn tune(
    train: &DMatrix<f64>,
    target: &DVector<f64>,
    widths: &[f64],
    noise: f64,
) -> Result<TunedHyperparameters, ModelError> {
    if train.nrows() != target.len() {
        return Err(ModelError::ShapeMismatch {
            what: "tuner target rows",
            expected: train.nrows(),
            found: target.len(),
        });
    }

    let mut theta0: Vec<f64> = resolve_widths(widths, train.ncols())?
        .into_iter()
        .map(|w| w.max(HYPER_FLOOR))
        .collect();
    theta0.push(noise.max(HYPER_FLOOR));

    // Initial simplex: the starting point plus one vertex per parameter,
    // displaced multiplicatively to respect the positive scale of the space.
    let mut simplex = vec![theta0.clone()];
    for i in 0..theta0.len() {
        let mut vertex = theta0.clone();
        vertex[i] = vertex[i] * 1.25 + 0.05;
        simplex.push(vertex);
    }

    let solver = NelderMead::new(simplex)
        .with_sd_tolerance(1e-10)
        .map_err(|e: Error| ModelError::Optimization(e.to_string()))?;
    let objective = LikelihoodObjective { train, target };

    let result = Executor::new(objective, solver)
        .configure(|state| state.max_iters(MAX_ITERS))
        .run()
        .map_err(|e| ModelError::Optimization(e.to_string()))?;

    let best = result
        .state()
        .get_best_param()
        .cloned()
        .unwrap_or(theta0);
    debug!(
        cost = result.state().get_best_cost(),
        iterations = result.state().get_iter(),
        "hyperparameter search finished"
    );

    let (widths, noise) = split_theta(&best);
    Ok(TunedHyperparameters {
        widths: widths.iter().map(|w| w.max(HYPER_FLOOR)).collect(),
        noise: noise.max(HYPER_FLOOR),
    })
}
