use super::GraphError;
use crate::core::elements;
use crate::core::elements::ElementProperty;
use crate::core::models::structure::Structure;
use nalgebra::{DMatrix, DVector, Point3};

/// Default buffer distance added to the covalent-radius sum when deciding
/// whether two atoms are neighbors, in Angstroms.
pub const DEFAULT_BUFFER: f64 = 0.2;

/// Reference bulk coordination used to normalize generalized coordination.
const BULK_COORDINATION: f64 = 12.0;

/// Builds the first-shell neighbor list for a structure.
///
/// Atom `j` is a neighbor of atom `i` when their distance `d` satisfies
/// `d_max1 < d < d_max2`, with `d_max2 = shell * (r_i + r_j) + dx` and
/// `d_max1 = (shell - 1) * (r_i + r_j) + dx` (zero for the first shell),
/// where `r_i`, `r_j` are the covalent radii of the two atom types.
///
/// # Errors
///
/// Only `shell == 1` is implemented; any other value fails with
/// [`GraphError::UnsupportedShell`]. Unknown atomic numbers propagate as
/// element lookup errors.
pub fn neighbor_list(
    structure: &Structure,
    dx: f64,
    shell: u32,
) -> Result<Vec<Vec<usize>>, GraphError> {
    let radii = structure
        .atoms()
        .iter()
        .map(|a| elements::covalent_radius(a.atomic_number))
        .collect::<Result<Vec<_>, _>>()?;
    let positions: Vec<Point3<f64>> = structure.atoms().iter().map(|a| a.position).collect();

    neighbor_list_with_radii(&positions, &radii, dx, shell)
}

/// Radius-explicit variant of [`neighbor_list`], used once covalent radii have
/// been resolved. `positions` and `radii` must be index-aligned.
pub fn neighbor_list_with_radii(
    positions: &[Point3<f64>],
    radii: &[f64],
    dx: f64,
    shell: u32,
) -> Result<Vec<Vec<usize>>, GraphError> {
    if shell != 1 {
        return Err(GraphError::UnsupportedShell(shell));
    }

    let n = positions.len();
    let mut conn = Vec::with_capacity(n);
    for i in 0..n {
        let mut conn_this_atom = Vec::new();
        for j in 0..n {
            if i == j {
                continue;
            }
            let d = (positions[i] - positions[j]).norm();
            let d_max2 = (radii[i] + radii[j]) + dx;
            if d > 0.0 && d < d_max2 {
                conn_this_atom.push(j);
            }
        }
        conn.push(conn_this_atom);
    }
    Ok(conn)
}

/// Builds the binary connectivity matrix for a structure.
///
/// Entry `(i, j)` is 1.0 when `j` is in `i`'s first neighbor shell, else 0.0;
/// the diagonal is always zero. A neighbor list attached to the structure is
/// reused instead of recomputing pairwise distances.
pub fn connectivity_matrix(structure: &Structure, dx: f64) -> Result<DMatrix<f64>, GraphError> {
    let n = structure.len();
    let nl = match structure.neighborlist() {
        Some(nl) => {
            if nl.len() != n {
                return Err(GraphError::InvalidNeighborList {
                    expected: n,
                    found: nl.len(),
                });
            }
            nl.to_vec()
        }
        None => neighbor_list(structure, dx, 1)?,
    };

    let mut cm = DMatrix::zeros(n, n);
    for (i, neighbors) in nl.iter().enumerate() {
        for &j in neighbors {
            cm[(i, j)] = 1.0;
        }
    }
    Ok(cm)
}

/// The per-atom generalized coordination vector for a connectivity matrix.
///
/// For atom `i` this is the sum of the connected atoms' own (possibly
/// weighted) degree, normalized by the bulk reference coordination of 12:
/// `gcn[i] = sum_{j in N(i)} rowsum(j) / 12`. A hub whose center sits at the
/// reference coordination therefore scores 1.0 on every atom.
pub fn generalized_coordination(cm: &DMatrix<f64>) -> DVector<f64> {
    let n = cm.nrows();
    let rowsums: Vec<f64> = (0..n).map(|i| cm.row(i).sum()).collect();

    DVector::from_fn(n, |i, _| {
        let mut tot = 0.0;
        for j in 0..n {
            if cm[(i, j)] != 0.0 {
                tot += rowsums[j];
            }
        }
        tot / BULK_COORDINATION
    })
}

/// Builds the broadcast property matrix for a structure.
///
/// Every row is the per-atom property vector, so the elementwise product with
/// a connectivity matrix weights each connection by the property of the
/// connected (column) atom.
///
/// # Errors
///
/// Propagates element lookup failures; a property that is not tabulated for
/// one of the present atom types is an error, never a silent default.
pub fn property_matrix(
    structure: &Structure,
    property: ElementProperty,
) -> Result<DMatrix<f64>, GraphError> {
    let values = structure
        .atoms()
        .iter()
        .map(|a| elements::property(a.atomic_number, property))
        .collect::<Result<Vec<_>, _>>()?;

    let n = values.len();
    Ok(DMatrix::from_fn(n, n, |_, j| values[j]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::structure::Atom;

    fn linear_chain(spacing: f64) -> Structure {
        // Four Ni atoms along x; Ni covalent radius is 1.24, so with dx = 0.2
        // consecutive atoms connect when spacing < 2.68.
        let atoms = (0..4)
            .map(|i| Atom::new(28, Point3::new(i as f64 * spacing, 0.0, 0.0)))
            .collect();
        Structure::new("chain", atoms)
    }

    #[test]
    fn connectivity_is_symmetric_with_zero_diagonal() {
        let s = linear_chain(2.4);
        let cm = connectivity_matrix(&s, DEFAULT_BUFFER).unwrap();
        for i in 0..cm.nrows() {
            assert_eq!(cm[(i, i)], 0.0);
            for j in 0..cm.ncols() {
                assert_eq!(cm[(i, j)], cm[(j, i)]);
            }
        }
    }

    #[test]
    fn chain_connects_consecutive_atoms_only() {
        let s = linear_chain(2.4);
        let nl = neighbor_list(&s, DEFAULT_BUFFER, 1).unwrap();
        assert_eq!(nl, vec![vec![1], vec![0, 2], vec![1, 3], vec![2]]);
    }

    #[test]
    fn no_neighbors_when_distances_exceed_cutoff() {
        // Hand-computed scenario: equal radii 1.0, dx = 0.2 puts the cutoff at
        // 2.2 while every consecutive pair sits at sqrt(5) = 2.236.
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(2.0, 4.0, 0.0),
            Point3::new(3.0, 6.0, 0.0),
        ];
        let radii = vec![1.0; 4];
        let nl = neighbor_list_with_radii(&positions, &radii, 0.2, 1).unwrap();
        assert_eq!(nl, vec![Vec::<usize>::new(); 4]);
    }

    #[test]
    fn higher_shells_fail_fast() {
        let s = linear_chain(2.4);
        let err = neighbor_list(&s, DEFAULT_BUFFER, 2).unwrap_err();
        assert!(matches!(err, GraphError::UnsupportedShell(2)));
    }

    #[test]
    fn unknown_element_propagates_lookup_error() {
        let s = Structure::new("odd", vec![Atom::new(99, Point3::origin())]);
        let err = neighbor_list(&s, DEFAULT_BUFFER, 1).unwrap_err();
        assert!(matches!(err, GraphError::Element(_)));
    }

    #[test]
    fn attached_neighborlist_is_reused() {
        // Attach a list that contradicts the geometry; the matrix must follow
        // the attached list.
        let s = linear_chain(100.0).with_neighborlist(vec![vec![3], vec![], vec![], vec![0]]);
        let cm = connectivity_matrix(&s, DEFAULT_BUFFER).unwrap();
        assert_eq!(cm[(0, 3)], 1.0);
        assert_eq!(cm[(3, 0)], 1.0);
        assert_eq!(cm.sum(), 2.0);
    }

    #[test]
    fn mismatched_neighborlist_is_rejected() {
        let s = linear_chain(2.4).with_neighborlist(vec![vec![1]]);
        let err = connectivity_matrix(&s, DEFAULT_BUFFER).unwrap_err();
        assert!(matches!(
            err,
            GraphError::InvalidNeighborList {
                expected: 4,
                found: 1
            }
        ));
    }

    #[test]
    fn generalized_coordination_is_one_for_reference_hub() {
        // A hub cluster at the reference coordination: one center bonded to 12
        // satellites. Every atom's connected-degree sum is 12, so every value
        // is exactly 1.0.
        let n = 13;
        let mut cm = DMatrix::zeros(n, n);
        for j in 1..n {
            cm[(0, j)] = 1.0;
            cm[(j, 0)] = 1.0;
        }
        let gcn = generalized_coordination(&cm);
        for i in 0..n {
            assert!((gcn[i] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn generalized_coordination_is_non_negative() {
        let s = linear_chain(2.4);
        let cm = connectivity_matrix(&s, DEFAULT_BUFFER).unwrap();
        let gcn = generalized_coordination(&cm);
        assert!(gcn.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn property_matrix_broadcasts_column_atom_property() {
        let atoms = vec![
            Atom::new(28, Point3::new(0.0, 0.0, 0.0)),
            Atom::new(79, Point3::new(2.5, 0.0, 0.0)),
        ];
        let s = Structure::new("NiAu", atoms);
        let pm = property_matrix(&s, ElementProperty::AtomicWeight).unwrap();
        let ni = 58.693;
        let au = 196.967;
        for i in 0..2 {
            assert!((pm[(i, 0)] - ni).abs() < 1e-9);
            assert!((pm[(i, 1)] - au).abs() < 1e-9);
        }
    }

    #[test]
    fn property_matrix_fails_for_missing_property() {
        let s = Structure::new("iron", vec![Atom::new(26, Point3::origin())]);
        let err = property_matrix(&s, ElementProperty::VdwRadius).unwrap_err();
        assert!(matches!(err, GraphError::Element(_)));
    }
}
