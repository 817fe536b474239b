use thiserror::Error;

use crate::core::elements::ElementError;
use crate::core::features::AssemblyError;
use crate::core::graph::GraphError;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error(
        "Requested a fixed subset of {requested} features but only {available} remain after cleaning"
    )]
    SizeExceedsFeatures { requested: usize, available: usize },

    #[error("Shape mismatch for {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Numeric instability in {stage}: {message}")]
    NumericInstability {
        stage: &'static str,
        message: String,
    },

    #[error("Element data lookup failed: {0}")]
    Lookup(#[from] ElementError),

    #[error("Graph construction failed: {0}")]
    Graph(#[from] GraphError),

    #[error("Feature assembly failed: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Hyperparameter optimization failed: {0}")]
    Optimization(String),
}
