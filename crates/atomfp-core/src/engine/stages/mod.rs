//! # Stages Module
//!
//! The column-preserving transformations applied to a [`SelectionState`]
//! before reduction: zero-variance cleaning, train-statistics
//! standardization, and combinatorial feature expansion.
//!
//! [`SelectionState`]: crate::engine::state::SelectionState

pub mod clean;
pub mod expand;
pub mod standardize;
