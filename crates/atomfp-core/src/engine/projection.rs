use crate::engine::error::ModelError;
use nalgebra::{DMatrix, DVector};

/// Train and test matrices projected onto leading principal components.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub train: DMatrix<f64>,
    pub test: DMatrix<f64>,
}

/// Projects both partitions onto the leading `components` principal
/// components of the training matrix.
///
/// The rotation is derived from the train partition alone (column means and
/// singular vectors); the test partition is centered with the train means and
/// rotated with the same basis.
pub fn pca(
    train: &DMatrix<f64>,
    test: &DMatrix<f64>,
    components: usize,
) -> Result<Projection, ModelError> {
    let n = train.nrows();
    let d = train.ncols();
    let available = n.min(d);
    if components == 0 || components > available {
        return Err(ModelError::ShapeMismatch {
            what: "principal components",
            expected: available,
            found: components,
        });
    }

    let means = DVector::from_fn(d, |j, _| train.column(j).sum() / n as f64);
    let centered = center(train, &means);

    let svd = centered.clone().svd(false, true);
    let v_t = svd.v_t.as_ref().ok_or(ModelError::NumericInstability {
        stage: "pca",
        message: "SVD did not produce V^T".to_string(),
    })?;

    // Rotation: the leading right singular vectors as columns.
    let rotation = v_t.rows(0, components).transpose();

    Ok(Projection {
        train: centered * &rotation,
        test: center(test, &means) * &rotation,
    })
}

fn center(matrix: &DMatrix<f64>, means: &DVector<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(matrix.nrows(), matrix.ncols(), |i, j| {
        matrix[(i, j)] - means[j]
    })
}
