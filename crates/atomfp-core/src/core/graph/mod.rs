//! # Graph Module
//!
//! Connectivity math over atomic structures: first-shell neighbor lists derived
//! from covalent radii, binary adjacency matrices, property-weighted variants,
//! generalized coordination, and the fixed-layout fingerprint vector built on
//! top of them.

pub mod connectivity;
pub mod fingerprint;

use crate::core::elements::ElementError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Neighbor shell {0} is not supported; only the first shell is implemented")]
    UnsupportedShell(u32),

    #[error("Attached neighbor list covers {found} atoms but the structure has {expected}")]
    InvalidNeighborList { expected: usize, found: usize },

    #[error("Element data lookup failed: {0}")]
    Element(#[from] ElementError),
}
