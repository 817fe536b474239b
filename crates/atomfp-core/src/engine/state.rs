use crate::engine::error::ModelError;
use nalgebra::DMatrix;
use std::collections::HashSet;

/// The intermediate value carried through the reduction stages.
///
/// Train matrix, test matrix, and feature names always describe the same
/// column set; every column drop or restriction goes through the methods
/// here so the three can never fall out of alignment. Stages consume a state
/// and return a fresh one.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub train: DMatrix<f64>,
    pub test: DMatrix<f64>,
    pub names: Vec<String>,
    /// Best validation error observed so far, if any stage has measured one.
    pub best_error: f64,
    /// Subset size associated with `best_error`.
    pub best_size: usize,
}

impl SelectionState {
    pub fn new(
        train: DMatrix<f64>,
        test: DMatrix<f64>,
        names: Vec<String>,
    ) -> Result<Self, ModelError> {
        if test.ncols() != train.ncols() {
            return Err(ModelError::ShapeMismatch {
                what: "test matrix columns",
                expected: train.ncols(),
                found: test.ncols(),
            });
        }
        if names.len() != train.ncols() {
            return Err(ModelError::ShapeMismatch {
                what: "feature names",
                expected: train.ncols(),
                found: names.len(),
            });
        }
        Ok(Self {
            train,
            test,
            names,
            best_error: f64::INFINITY,
            best_size: 0,
        })
    }

    pub fn sample_count(&self) -> usize {
        self.train.nrows()
    }

    pub fn feature_count(&self) -> usize {
        self.train.ncols()
    }

    /// Returns a state restricted to the given columns, in ascending original
    /// order. The matrices and the name list are restricted together.
    pub fn keep_columns(&self, keep: &[usize]) -> Self {
        let mut keep = keep.to_vec();
        keep.sort_unstable();
        keep.dedup();

        let train = self.train.select_columns(keep.iter());
        let test = self.test.select_columns(keep.iter());
        let names = keep.iter().map(|&i| self.names[i].clone()).collect();
        Self {
            train,
            test,
            names,
            best_error: self.best_error,
            best_size: self.best_size,
        }
    }

    /// Returns a state with the given columns removed from the matrices and
    /// the name list together.
    pub fn drop_columns(&self, drop: &[usize]) -> Self {
        let drop: HashSet<usize> = drop.iter().copied().collect();
        let keep: Vec<usize> = (0..self.feature_count())
            .filter(|i| !drop.contains(i))
            .collect();
        self.keep_columns(&keep)
    }

    /// Records a newly observed best (validation error, subset size) pair.
    pub fn with_best(mut self, error: f64, size: usize) -> Self {
        self.best_error = error;
        self.best_size = size;
        self
    }
}
