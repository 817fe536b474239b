use crate::engine::state::SelectionState;
use nalgebra::DMatrix;

/// Indices of training columns whose values are all identical.
pub fn zero_variance_columns(train: &DMatrix<f64>) -> Vec<usize> {
    (0..train.ncols())
        .filter(|&j| {
            let col = train.column(j);
            let first = col[0];
            col.iter().all(|&v| v == first)
        })
        .collect()
}

/// Removes zero-variance training columns from train, test, and names
/// together, returning the fresh state and the dropped column indices.
pub fn clean(state: SelectionState) -> (SelectionState, Vec<usize>) {
    let dropped = zero_variance_columns(&state.train);
    if dropped.is_empty() {
        return (state, dropped);
    }
    let cleaned = state.drop_columns(&dropped);
    (cleaned, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_set_equals_zero_variance_indices() {
        let train = DMatrix::from_row_slice(
            3,
            4,
            &[
                1.0, 7.0, 0.0, 4.0, //
                2.0, 7.0, 0.0, 8.0, //
                3.0, 7.0, 0.0, 12.0,
            ],
        );
        let test = DMatrix::zeros(2, 4);
        let names = (0..4).map(|i| format!("f{i}")).collect();
        let state = SelectionState::new(train, test, names).unwrap();

        let (cleaned, dropped) = clean(state);
        assert_eq!(dropped, vec![1, 2]);
        assert_eq!(cleaned.names, vec!["f0", "f3"]);
        assert_eq!(cleaned.feature_count(), 2);

        // No retained training column has zero variance.
        assert!(zero_variance_columns(&cleaned.train).is_empty());
    }

    #[test]
    fn clean_is_identity_when_all_columns_vary() {
        let train = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let test = DMatrix::zeros(1, 2);
        let names = vec!["a".to_string(), "b".to_string()];
        let state = SelectionState::new(train, test, names).unwrap();

        let (cleaned, dropped) = clean(state.clone());
        assert!(dropped.is_empty());
        assert_eq!(cleaned, state);
    }
}
