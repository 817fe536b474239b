//! # Models Module
//!
//! Immutable input models for fingerprint generation. A [`structure::Structure`] is
//! an ordered collection of atoms with 3D positions and atomic numbers, tagged with
//! an opaque identifier and optionally carrying a precomputed neighbor list.

pub mod structure;
