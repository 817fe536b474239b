use crate::core::graph::GraphError;
use crate::core::models::structure::Structure;
use nalgebra::DMatrix;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("No structures supplied")]
    Empty,

    #[error("Structure '{id}' produced {found} features, expected {expected}")]
    Ragged {
        id: String,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// A feature matrix with its row-aligned structure identifiers.
///
/// Row `i` of the matrix is the fingerprint of the structure whose identifier
/// sits at `ids[i]`; the pipeline preserves this row order end to end.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledFeatures {
    pub matrix: DMatrix<f64>,
    pub ids: Vec<String>,
}

/// Stacks per-structure fingerprint vectors into a feature matrix.
///
/// Every structure must yield a vector of the same length; a ragged result
/// means the caller's fingerprint function is not deterministic over the
/// structure set and is reported as an error immediately rather than
/// surfacing later as a shape failure inside the pipeline.
pub fn assemble<F>(structures: &[Structure], mut fingerprint: F) -> Result<AssembledFeatures, AssemblyError>
where
    F: FnMut(&Structure) -> Result<Vec<f64>, GraphError>,
{
    if structures.is_empty() {
        return Err(AssemblyError::Empty);
    }

    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(structures.len());
    let mut ids = Vec::with_capacity(structures.len());
    let mut width: Option<usize> = None;

    for structure in structures {
        let fp = fingerprint(structure)?;
        match width {
            None => width = Some(fp.len()),
            Some(expected) if expected != fp.len() => {
                return Err(AssemblyError::Ragged {
                    id: structure.id().to_string(),
                    expected,
                    found: fp.len(),
                });
            }
            Some(_) => {}
        }
        ids.push(structure.id().to_string());
        rows.push(fp);
    }

    let ncols = width.unwrap_or(0);
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Ok(AssembledFeatures {
        matrix: DMatrix::from_row_slice(structures.len(), ncols, &flat),
        ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::structure::Atom;
    use nalgebra::Point3;

    fn dimer(id: &str, z: u8, spacing: f64) -> Structure {
        Structure::new(
            id,
            vec![
                Atom::new(z, Point3::new(0.0, 0.0, 0.0)),
                Atom::new(z, Point3::new(spacing, 0.0, 0.0)),
            ],
        )
    }

    #[test]
    fn assemble_stacks_rows_in_structure_order() {
        let structures = vec![dimer("a", 28, 2.4), dimer("b", 28, 5.0)];
        let out = assemble(&structures, |s| {
            crate::core::graph::fingerprint::fingerprint(s, &[])
        })
        .unwrap();

        assert_eq!(out.ids, vec!["a", "b"]);
        assert_eq!(out.matrix.nrows(), 2);
        // The bonded dimer has two coordination counts, the distant one none.
        assert!(out.matrix[(0, 0)] > out.matrix[(1, 0)]);
    }

    #[test]
    fn assemble_rejects_empty_input() {
        let out = assemble(&[], |_| Ok(vec![1.0]));
        assert!(matches!(out, Err(AssemblyError::Empty)));
    }

    #[test]
    fn assemble_rejects_ragged_rows() {
        let structures = vec![dimer("a", 28, 2.4), dimer("b", 79, 2.4)];
        let mut toggle = false;
        let out = assemble(&structures, |_| {
            toggle = !toggle;
            Ok(if toggle { vec![1.0, 2.0] } else { vec![1.0] })
        });
        assert!(matches!(
            out,
            Err(AssemblyError::Ragged {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }
}
