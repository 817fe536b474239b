use crate::engine::config::ExpansionParams;
use crate::engine::state::SelectionState;
use itertools::Itertools;
use nalgebra::{DMatrix, DVector};

/// Magnitude floor applied inside ratios and logarithms so standardized
/// (sign-mixed, zero-crossing) inputs stay finite.
const MAGNITUDE_FLOOR: f64 = 1e-12;

/// Combinatorially expands a feature matrix.
///
/// Appends, in order: pairwise products `x_i * x_j` (i < j), pairwise ratios
/// `x_i / x_j` (ordered pairs), powered products `x_i^a * x_j^b` (i < j), and
/// log combinations `a*ln|x_i| + b*ln|x_j|` (i < j). The original columns
/// remain an untouched fixed-position prefix, and every rule depends only on
/// the row being transformed, so train and test expand identically with no
/// leakage of test statistics.
pub fn expand_matrix(matrix: &DMatrix<f64>, params: &ExpansionParams) -> DMatrix<f64> {
    let d = matrix.ncols();
    if d == 0 {
        return matrix.clone();
    }
    let a = params.power_a;
    let b = params.power_b;

    let mut columns: Vec<DVector<f64>> = (0..d).map(|j| matrix.column(j).into_owned()).collect();

    for (i, j) in (0..d).tuple_combinations() {
        columns.push(matrix.column(i).component_mul(&matrix.column(j)));
    }
    for (i, j) in (0..d).cartesian_product(0..d) {
        if i != j {
            columns.push(DVector::from_fn(matrix.nrows(), |r, _| {
                matrix[(r, i)] / clamp_magnitude(matrix[(r, j)])
            }));
        }
    }
    for (i, j) in (0..d).tuple_combinations() {
        columns.push(DVector::from_fn(matrix.nrows(), |r, _| {
            matrix[(r, i)].powi(a) * matrix[(r, j)].powi(b)
        }));
    }
    for (i, j) in (0..d).tuple_combinations() {
        columns.push(DVector::from_fn(matrix.nrows(), |r, _| {
            f64::from(a) * ln_magnitude(matrix[(r, i)]) + f64::from(b) * ln_magnitude(matrix[(r, j)])
        }));
    }

    DMatrix::from_columns(&columns)
}

/// Extends a name list with composite labels matching [`expand_matrix`].
pub fn expand_names(names: &[String], params: &ExpansionParams) -> Vec<String> {
    let d = names.len();
    let a = params.power_a;
    let b = params.power_b;

    let mut out = names.to_vec();
    for (i, j) in (0..d).tuple_combinations() {
        out.push(format!("({}*{})", names[i], names[j]));
    }
    for (i, j) in (0..d).cartesian_product(0..d) {
        if i != j {
            out.push(format!("({}/{})", names[i], names[j]));
        }
    }
    for (i, j) in (0..d).tuple_combinations() {
        out.push(format!("({}^{}*{}^{})", names[i], a, names[j], b));
    }
    for (i, j) in (0..d).tuple_combinations() {
        out.push(format!("({}ln|{}|+{}ln|{}|)", a, names[i], b, names[j]));
    }
    out
}

/// Expands train, test, and names together.
pub fn expand(state: SelectionState, params: &ExpansionParams) -> SelectionState {
    SelectionState {
        train: expand_matrix(&state.train, params),
        test: expand_matrix(&state.test, params),
        names: expand_names(&state.names, params),
        best_error: state.best_error,
        best_size: state.best_size,
    }
}

/// The expanded column count for `d` originals.
pub fn expanded_width(d: usize) -> usize {
    let pairs = d * d.saturating_sub(1) / 2;
    let ordered = d * d.saturating_sub(1);
    d + 3 * pairs + ordered
}

fn clamp_magnitude(v: f64) -> f64 {
    if v.abs() < MAGNITUDE_FLOOR {
        MAGNITUDE_FLOOR.copysign(if v == 0.0 { 1.0 } else { v })
    } else {
        v
    }
}

fn ln_magnitude(v: f64) -> f64 {
    v.abs().max(MAGNITUDE_FLOOR).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ExpansionParams {
        ExpansionParams::default()
    }

    fn sample_state() -> SelectionState {
        let train = DMatrix::from_row_slice(3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let test = DMatrix::from_row_slice(1, 3, &[2.0, 3.0, 4.0]);
        let names = vec!["f0", "f1", "f2"].into_iter().map(String::from).collect();
        SelectionState::new(train, test, names).unwrap()
    }

    #[test]
    fn originals_remain_fixed_position_prefix() {
        let state = sample_state();
        let expanded = expand(state.clone(), &params());

        assert_eq!(expanded.feature_count(), expanded_width(3));
        let prefix = expanded.train.columns(0, 3).into_owned();
        assert_eq!(prefix, state.train);
        let test_prefix = expanded.test.columns(0, 3).into_owned();
        assert_eq!(test_prefix, state.test);
        assert_eq!(&expanded.names[..3], &state.names[..]);
    }

    #[test]
    fn expanded_values_match_hand_computation() {
        let state = sample_state();
        let expanded = expand(state, &params());

        // Column layout after the 3 originals: 3 products, 6 ratios,
        // 3 powered products, 3 log combinations.
        let first_product = expanded.train[(0, 3)]; // f0*f1 on row [1,2,3]
        assert!((first_product - 2.0).abs() < 1e-12);
        let first_ratio = expanded.train[(0, 6)]; // f0/f1
        assert!((first_ratio - 0.5).abs() < 1e-12);
        let powered = expanded.train[(0, 12)]; // f0^2 * f1^4
        assert!((powered - 16.0).abs() < 1e-12);
        let ablog = expanded.train[(0, 15)]; // 2ln|f0| + 4ln|f1|
        assert!((ablog - 4.0 * 2.0f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn names_track_every_expanded_column() {
        let state = sample_state();
        let expanded = expand(state, &params());
        assert_eq!(expanded.names.len(), expanded.feature_count());
        assert_eq!(expanded.names[3], "(f0*f1)");
        assert_eq!(expanded.names[6], "(f0/f1)");
        assert_eq!(expanded.names[12], "(f0^2*f1^4)");
        assert_eq!(expanded.names[15], "(2ln|f0|+4ln|f1|)");
    }

    #[test]
    fn zero_and_negative_inputs_stay_finite() {
        let train = DMatrix::from_row_slice(2, 2, &[0.0, -1.5, -2.0, 0.5]);
        let test = DMatrix::from_row_slice(1, 2, &[0.0, 0.0]);
        let names = vec!["a".to_string(), "b".to_string()];
        let state = SelectionState::new(train, test, names).unwrap();

        let expanded = expand(state, &params());
        assert!(expanded.train.iter().all(|v| v.is_finite()));
        assert!(expanded.test.iter().all(|v| v.is_finite()));
    }
}
