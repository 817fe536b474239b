//! # Core Module
//!
//! Fundamental building blocks for structure fingerprinting: the immutable input
//! models, the static element-data tables, the connectivity graph math, and the
//! assembly of per-structure fingerprint vectors into feature matrices.
//!
//! ## Architecture
//!
//! - **Structure Representation** ([`models`]) - Atoms and structures as supplied by the caller
//! - **Element Data** ([`elements`]) - Compile-time tables of covalent radii and typed physical properties
//! - **Connectivity & Fingerprints** ([`graph`]) - Neighbor shells, adjacency matrices, and the fingerprint layout
//! - **Feature Assembly** ([`features`]) - Stacking fingerprint vectors into identifier-tagged matrices
//!
//! Everything in this layer is a pure function of its inputs; no stage mutates a
//! structure or caches state between calls.

pub mod elements;
pub mod features;
pub mod graph;
pub mod models;
