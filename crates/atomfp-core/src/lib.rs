//! # AtomFP Core Library
//!
//! A library for turning atomic-structure data into numeric feature vectors
//! ("fingerprints") and for searching out the smallest, most predictive subset of
//! those features for a kernel-based surrogate regression model.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models (`Structure`),
//!   static element data, and the pure connectivity/fingerprint math that converts
//!   geometry into ordered feature vectors.
//!
//! - **[`engine`]: The Logic Core.** This layer holds the feature-selection machinery:
//!   configuration, the `SelectionState` threaded through every transformation stage,
//!   the screening/regression/projection primitives, the kernel predictor, the
//!   hyperparameter tuner, and the descriptor store.
//!
//! - **[`workflows`]: The Public API.** This is the highest-level, user-facing layer.
//!   It ties the `engine` and `core` together to execute the complete model-building
//!   procedure, from raw structures to a reduced feature matrix.

pub mod core;
pub mod engine;
pub mod workflows;
