//! # Workflows Module
//!
//! High-level entry points that tie the `core` and `engine` layers together.
//!
//! ## Architecture
//!
//! - **Model Building** ([`build`]) - The complete pipeline from raw structures
//!   (or a precomputed feature matrix) to a reduced, named feature matrix:
//!   ingest, persist, clean, standardize, baseline, expand, screen, rank,
//!   path-select, size-search, finalize.

pub mod build;
