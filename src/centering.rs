//! Gower double centering of a squared-dissimilarity matrix.

use crate::dissimilarity::DissimilarityMatrix;
use crate::error::{MdsError, Result};
use log::trace;
use ndarray::{Array2, Axis};

/// Converts squared dissimilarities into the centered Gram-like matrix `B = -1/2 * J D J`,
/// where `J = I - (1/M) 11^T`.
///
/// The centering projector is never formed. Instead two passes are made:
/// 1. subtract each row mean from its row and scale by `-1/2`, giving
///    `I_ij = -1/2 D_ij + 1/2 r_i`;
/// 2. subtract the column means of `I` from every row of `I`.
///
/// For symmetric `D` this equals the closed form
/// `B_ij = -1/2 (D_ij - r_i - r_j + g)` with `g` the grand mean. The result is
/// symmetrized exactly so that downstream solvers reading one triangle see the same matrix
/// as solvers reading the other.
///
/// # Errors
/// `NonFinite` when the centered matrix contains NaN or infinity (overflow on huge inputs).
///
/// # Examples
///
/// ```
/// use classical_mds::{double_center, DissimilarityMatrix};
/// use ndarray::array;
///
/// let d = DissimilarityMatrix::new(array![[0.0, 4.0], [4.0, 0.0]]).unwrap();
/// let b = double_center(&d).unwrap();
/// assert!((b[[0, 0]] - 1.0).abs() < 1e-12);
/// assert!((b[[0, 1]] + 1.0).abs() < 1e-12);
/// ```
pub fn double_center(dissimilarities: &DissimilarityMatrix) -> Result<Array2<f64>> {
    let d = dissimilarities.view();
    let m = d.nrows();

    let row_means = d
        .mean_axis(Axis(1))
        .ok_or_else(|| MdsError::DegenerateInput { size: m })?;

    // Pass 1: I = -0.5 * D + 0.5 * r 1^T
    let mut intermediate = d.to_owned();
    intermediate.par_mapv_inplace(|x| -0.5 * x);
    intermediate += &row_means.mapv(|r| 0.5 * r).insert_axis(Axis(1));

    // Pass 2: subtract the column means of I, broadcast down every row.
    let column_means = intermediate
        .mean_axis(Axis(0))
        .ok_or_else(|| MdsError::DegenerateInput { size: m })?;
    let mut centered = intermediate;
    centered -= &column_means.insert_axis(Axis(0));

    symmetrize_in_place(&mut centered);

    if centered.iter().any(|v| !v.is_finite()) {
        return Err(MdsError::NonFinite { stage: "double-centered matrix" });
    }
    trace!("Double-centered {}x{} matrix, trace = {:e}", m, m, centered.diag().sum());
    Ok(centered)
}

/// Replaces each off-diagonal pair with its average.
fn symmetrize_in_place(matrix: &mut Array2<f64>) {
    let m = matrix.nrows();
    for i in 0..m {
        for j in (i + 1)..m {
            let avg = 0.5 * (matrix[[i, j]] + matrix[[j, i]]);
            matrix[[i, j]] = avg;
            matrix[[j, i]] = avg;
        }
    }
}
