use nalgebra::Point3;

/// Represents a single atom within a structure.
///
/// This struct carries the minimal information the fingerprint pipeline needs:
/// the element identity (as an atomic number) and the 3D position. Everything
/// else about an atom (properties, radii) is looked up from the static element
/// tables at computation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atom {
    /// The atomic number of the element (e.g., 28 for Ni).
    pub atomic_number: u8,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    /// Creates a new `Atom` from an atomic number and a position.
    pub fn new(atomic_number: u8, position: Point3<f64>) -> Self {
        Self {
            atomic_number,
            position,
        }
    }
}

/// An ordered collection of atoms with a structure-level identifier.
///
/// Structures are immutable inputs owned by the caller. The identifier is
/// opaque to the pipeline; it is only carried alongside feature-matrix rows and
/// into the descriptor store. A precomputed neighbor list may be attached so
/// the connectivity builder can skip the pairwise distance scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    id: String,
    atoms: Vec<Atom>,
    neighborlist: Option<Vec<Vec<usize>>>,
}

impl Structure {
    /// Creates a new `Structure` from an identifier and an ordered atom list.
    pub fn new(id: impl Into<String>, atoms: Vec<Atom>) -> Self {
        Self {
            id: id.into(),
            atoms,
            neighborlist: None,
        }
    }

    /// Attaches a precomputed neighbor list (one index list per atom, in atom
    /// order). The connectivity builder reuses this instead of recomputing
    /// pairwise distances.
    pub fn with_neighborlist(mut self, neighborlist: Vec<Vec<usize>>) -> Self {
        self.neighborlist = Some(neighborlist);
        self
    }

    /// The opaque structure identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The ordered atom list.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// The number of atoms in the structure.
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    /// Whether the structure contains no atoms.
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// The atomic numbers of all atoms, in atom order.
    pub fn atomic_numbers(&self) -> Vec<u8> {
        self.atoms.iter().map(|a| a.atomic_number).collect()
    }

    /// The attached precomputed neighbor list, if any.
    pub fn neighborlist(&self) -> Option<&[Vec<usize>]> {
        self.neighborlist.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn new_structure_has_expected_fields() {
        let atoms = vec![
            Atom::new(28, Point3::new(0.0, 0.0, 0.0)),
            Atom::new(79, Point3::new(1.0, 0.0, 0.0)),
        ];
        let s = Structure::new("cluster-1", atoms);

        assert_eq!(s.id(), "cluster-1");
        assert_eq!(s.len(), 2);
        assert!(!s.is_empty());
        assert_eq!(s.atomic_numbers(), vec![28, 79]);
        assert!(s.neighborlist().is_none());
    }

    #[test]
    fn with_neighborlist_attaches_metadata() {
        let atoms = vec![
            Atom::new(28, Point3::new(0.0, 0.0, 0.0)),
            Atom::new(28, Point3::new(1.0, 0.0, 0.0)),
        ];
        let nl = vec![vec![1], vec![0]];
        let s = Structure::new("pair", atoms).with_neighborlist(nl.clone());
        assert_eq!(s.neighborlist(), Some(nl.as_slice()));
    }
}
