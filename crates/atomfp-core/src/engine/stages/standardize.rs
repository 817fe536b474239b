use crate::engine::state::SelectionState;

/// Per-column affine transform derived from training statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
}

/// Rescales every feature to zero mean and unit scale using training-set
/// statistics, applying the identical transform to the test partition.
///
/// Columns with zero spread keep a unit scale; the cleaning stage is expected
/// to have removed them already.
pub fn standardize(state: SelectionState) -> (SelectionState, Standardizer) {
    let n = state.sample_count() as f64;
    let d = state.feature_count();

    let mut means = Vec::with_capacity(d);
    let mut scales = Vec::with_capacity(d);
    for j in 0..d {
        let col = state.train.column(j);
        let mean = col.sum() / n;
        let var = col.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n;
        let std = var.sqrt();
        means.push(mean);
        scales.push(if std > 0.0 { std } else { 1.0 });
    }

    let mut train = state.train.clone();
    let mut test = state.test.clone();
    for j in 0..d {
        for i in 0..train.nrows() {
            train[(i, j)] = (train[(i, j)] - means[j]) / scales[j];
        }
        for i in 0..test.nrows() {
            test[(i, j)] = (test[(i, j)] - means[j]) / scales[j];
        }
    }

    let standardized = SelectionState {
        train,
        test,
        names: state.names,
        best_error: state.best_error,
        best_size: state.best_size,
    };
    (standardized, Standardizer { means, scales })
}
