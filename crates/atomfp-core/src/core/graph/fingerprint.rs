use super::GraphError;
use super::connectivity::{self, DEFAULT_BUFFER};
use crate::core::elements::{self, ElementProperty};
use crate::core::models::structure::Structure;
use nalgebra::{DMatrix, DVector};

/// The distinct atomic numbers present in a structure, in ascending order.
///
/// All fingerprint iteration runs over this ordering so that feature values
/// and labels stay aligned across repeated calls and across train/test sets.
pub fn sorted_types(atomic_numbers: &[u8]) -> Vec<u8> {
    let mut types: Vec<u8> = atomic_numbers.to_vec();
    types.sort_unstable();
    types.dedup();
    types
}

/// The fingerprint vector length for a given atom-type count and number of
/// requested weighting properties.
///
/// Each pass contributes, per type, three level-one scalars, one homoatomic
/// bond count, one heteroatomic count per unordered type pair, and three
/// level-three scalars; the unweighted pass is always present.
pub fn fingerprint_len(type_count: usize, property_count: usize) -> usize {
    let per_pass = 7 * type_count + type_count * type_count.saturating_sub(1) / 2;
    (1 + property_count) * per_pass
}

/// Generates the full fingerprint vector for a structure.
///
/// The unweighted pass runs over the plain connectivity matrix; one further
/// pass runs per requested property, with the connectivity matrix weighted
/// elementwise by the broadcast property matrix. Each pass recomputes the
/// row sums and the generalized-coordination vector from its own matrix.
///
/// # Errors
///
/// Propagates element lookup failures (unknown atomic number, property not
/// tabulated for a present type) and geometry errors from the connectivity
/// builder.
pub fn fingerprint(
    structure: &Structure,
    properties: &[ElementProperty],
) -> Result<Vec<f64>, GraphError> {
    let an = structure.atomic_numbers();
    let cm = connectivity_matrix_for(structure)?;

    let mut fp = pass(&an, &cm);
    for &p in properties {
        let pm = connectivity::property_matrix(structure, p)?;
        let weighted = cm.component_mul(&pm);
        fp.extend(pass(&an, &weighted));
    }
    Ok(fp)
}

/// Deterministic column labels matching the [`fingerprint`] layout.
///
/// Unweighted columns read like `cn_sum[Ni]` or `bonds[Ni-Au]`; weighted
/// passes append the property key, e.g. `gcn_sq[Ni]@atomic_weight`.
pub fn fingerprint_labels(
    structure: &Structure,
    properties: &[ElementProperty],
) -> Result<Vec<String>, GraphError> {
    let an = structure.atomic_numbers();
    let types = sorted_types(&an);
    let symbols = types
        .iter()
        .map(|&z| elements::symbol_for_number(z))
        .collect::<Result<Vec<_>, _>>()?;

    let mut labels = pass_labels(&symbols, None);
    for &p in properties {
        labels.extend(pass_labels(&symbols, Some(p.label())));
    }
    Ok(labels)
}

fn connectivity_matrix_for(structure: &Structure) -> Result<DMatrix<f64>, GraphError> {
    connectivity::connectivity_matrix(structure, DEFAULT_BUFFER)
}

fn pass_labels(symbols: &[&str], property: Option<&str>) -> Vec<String> {
    let suffix = property.map(|p| format!("@{p}")).unwrap_or_default();
    let mut labels = Vec::new();
    for (ti, sym) in symbols.iter().enumerate() {
        labels.push(format!("cn_sum[{sym}]{suffix}"));
        labels.push(format!("cn_sq[{sym}]{suffix}"));
        labels.push(format!("cn_sqrt[{sym}]{suffix}"));
        labels.push(format!("bonds[{sym}-{sym}]{suffix}"));
        for other in &symbols[ti + 1..] {
            labels.push(format!("bonds[{sym}-{other}]{suffix}"));
        }
        labels.push(format!("gcn_sum[{sym}]{suffix}"));
        labels.push(format!("gcn_sq[{sym}]{suffix}"));
        labels.push(format!("gcn_sqrt[{sym}]{suffix}"));
    }
    labels
}

/// One fingerprint pass over a (plain or weighted) connectivity matrix.
fn pass(atomic_numbers: &[u8], cm: &DMatrix<f64>) -> Vec<f64> {
    let n = atomic_numbers.len();
    let rowsums = DVector::from_fn(n, |i, _| cm.row(i).sum());
    let gcn = connectivity::generalized_coordination(cm);
    let types = sorted_types(atomic_numbers);

    let mut fp = Vec::with_capacity(fingerprint_len(types.len(), 0));
    for (ti, &e) in types.iter().enumerate() {
        let el = type_indicator(atomic_numbers, e);

        // Level one: coordination sums masked to this type.
        let x = rowsums.component_mul(&el);
        fp.push(x.sum());
        fp.push(x.iter().map(|v| v * v).sum());
        fp.push(x.iter().map(|v| v.sqrt()).sum());

        // Level two: bond counts into columns of this type, then one
        // heteroatomic count per remaining pair. The heteroatomic indicator
        // keys on the first element of the pair only.
        let homo: f64 = (0..n)
            .map(|i| (0..n).map(|j| cm[(i, j)] * el[j]).sum::<f64>())
            .sum();
        fp.push(homo);
        let hetero = heteroatomic_matrix(atomic_numbers, e);
        for _ in &types[ti + 1..] {
            fp.push(hetero.component_mul(cm).sum());
        }

        // Level three: generalized coordination masked to this type.
        let g = gcn.component_mul(&el);
        fp.push(g.sum());
        fp.push(g.iter().map(|v| v * v).sum());
        fp.push(g.iter().map(|v| v.sqrt()).sum());
    }
    fp
}

/// Binary indicator over atoms: 1.0 where the atomic number matches.
fn type_indicator(atomic_numbers: &[u8], e: u8) -> DVector<f64> {
    DVector::from_fn(atomic_numbers.len(), |i, _| {
        if atomic_numbers[i] == e { 1.0 } else { 0.0 }
    })
}

/// Indicator matrix for connections from atoms of type `first` to atoms of
/// any other type. Rows of other types are all zero.
fn heteroatomic_matrix(atomic_numbers: &[u8], first: u8) -> DMatrix<f64> {
    let n = atomic_numbers.len();
    DMatrix::from_fn(n, n, |i, j| {
        if atomic_numbers[i] == first && atomic_numbers[j] != first {
            1.0
        } else {
            0.0
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::structure::Atom;
    use nalgebra::Point3;

    fn ni_au_pair() -> Structure {
        // Ni-Au distance 2.5 < (1.24 + 1.36) + 0.2 = 2.8, so the pair bonds.
        Structure::new(
            "NiAu",
            vec![
                Atom::new(28, Point3::new(0.0, 0.0, 0.0)),
                Atom::new(79, Point3::new(2.5, 0.0, 0.0)),
            ],
        )
    }

    #[test]
    fn sorted_types_are_ascending_and_unique() {
        assert_eq!(sorted_types(&[79, 28, 28, 79, 1]), vec![1, 28, 79]);
    }

    #[test]
    fn length_formula_matches_generated_vectors() {
        for (structure, type_count) in [
            (
                Structure::new("one", vec![Atom::new(28, Point3::origin())]),
                1,
            ),
            (ni_au_pair(), 2),
        ] {
            for properties in [
                vec![],
                vec![ElementProperty::AtomicWeight],
                vec![
                    ElementProperty::AtomicWeight,
                    ElementProperty::Electronegativity,
                ],
            ] {
                let fp = fingerprint(&structure, &properties).unwrap();
                assert_eq!(fp.len(), fingerprint_len(type_count, properties.len()));
            }
        }
    }

    #[test]
    fn labels_align_with_vector_layout() {
        let s = ni_au_pair();
        let properties = [ElementProperty::AtomicWeight];
        let fp = fingerprint(&s, &properties).unwrap();
        let labels = fingerprint_labels(&s, &properties).unwrap();
        assert_eq!(fp.len(), labels.len());
        assert_eq!(labels[0], "cn_sum[Ni]");
        assert_eq!(labels[4], "bonds[Ni-Au]");
        assert_eq!(labels[15], "cn_sum[Ni]@atomic_weight");
    }

    #[test]
    fn bonded_pair_has_expected_unweighted_values() {
        let fp = fingerprint(&ni_au_pair(), &[]).unwrap();
        // Ni block: level one over masked coordination [1, 0].
        assert!((fp[0] - 1.0).abs() < 1e-12);
        assert!((fp[1] - 1.0).abs() < 1e-12);
        assert!((fp[2] - 1.0).abs() < 1e-12);
        // One bond into the Ni column, one Ni->Au heteroatomic bond.
        assert!((fp[3] - 1.0).abs() < 1e-12);
        assert!((fp[4] - 1.0).abs() < 1e-12);
        // Level three: each atom's sole neighbor has degree 1.
        assert!((fp[5] - 1.0 / 12.0).abs() < 1e-12);
        assert!((fp[6] - 1.0 / 144.0).abs() < 1e-12);
        assert!((fp[7] - (1.0f64 / 12.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn fingerprint_is_invariant_to_atom_ordering() {
        let a = Structure::new(
            "fwd",
            vec![
                Atom::new(28, Point3::new(0.0, 0.0, 0.0)),
                Atom::new(79, Point3::new(2.5, 0.0, 0.0)),
                Atom::new(28, Point3::new(5.0, 0.0, 0.0)),
            ],
        );
        let b = Structure::new(
            "rev",
            vec![
                Atom::new(28, Point3::new(5.0, 0.0, 0.0)),
                Atom::new(79, Point3::new(2.5, 0.0, 0.0)),
                Atom::new(28, Point3::new(0.0, 0.0, 0.0)),
            ],
        );
        let fa = fingerprint(&a, &[ElementProperty::AtomicWeight]).unwrap();
        let fb = fingerprint(&b, &[ElementProperty::AtomicWeight]).unwrap();
        for (va, vb) in fa.iter().zip(&fb) {
            assert!((va - vb).abs() < 1e-12);
        }
    }

    #[test]
    fn weighted_pass_scales_with_property() {
        let s = ni_au_pair();
        let fp = fingerprint(&s, &[ElementProperty::AtomicWeight]).unwrap();
        // In the weighted pass the Ni->Au bond carries Au's atomic weight.
        let au = 196.967;
        assert!((fp[15 + 4] - au).abs() < 1e-9);
    }

    #[test]
    fn missing_property_propagates_error() {
        // Fe has no tabulated vdW radius, so the weighted pass must fail.
        let s = Structure::new(
            "FeFe",
            vec![
                Atom::new(26, Point3::new(0.0, 0.0, 0.0)),
                Atom::new(26, Point3::new(2.5, 0.0, 0.0)),
            ],
        );
        assert!(fingerprint(&s, &[ElementProperty::VdwRadius]).is_err());
        assert!(fingerprint(&s, &[]).is_ok());
    }
}
