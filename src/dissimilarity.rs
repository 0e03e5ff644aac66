//! Validated squared-dissimilarity matrices.
//!
//! A [`DissimilarityMatrix`] is built by whatever produced the pairwise dissimilarities
//! (frame collection, landmark selection, a precomputed file, ...). The MDS pipeline
//! only ever reads it.

use crate::error::{MdsError, Result};
use float_cmp::approx_eq;
use log::trace;
use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Tolerances applied when validating a dissimilarity matrix.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationTolerances {
    /// Relative tolerance for `|D_ij - D_ji|`, scaled by `max(|D_ij|, |D_ji|)`. Entries that
    /// are both zero, or within a few ULPs of each other, always pass.
    pub symmetry: f64,
    /// Absolute tolerance for diagonal entries.
    pub diagonal: f64,
}

impl Default for ValidationTolerances {
    fn default() -> Self {
        Self {
            symmetry: 1e-9,
            diagonal: 1e-9,
        }
    }
}

/// An M×M matrix of squared dissimilarities.
///
/// Invariants, checked on construction: square, `M >= 2`, finite, zero diagonal,
/// non-negative entries, symmetric within tolerance.
#[derive(Clone, Debug, PartialEq)]
pub struct DissimilarityMatrix {
    data: Array2<f64>,
}

impl DissimilarityMatrix {
    /// Validates `matrix` with the default tolerances.
    ///
    /// # Errors
    /// `DegenerateInput` when fewer than two observations are given, `NonFinite` for
    /// NaN/infinite entries and `InputShape` for every other violated invariant.
    ///
    /// # Examples
    ///
    /// ```
    /// use classical_mds::DissimilarityMatrix;
    /// use ndarray::array;
    ///
    /// let d = DissimilarityMatrix::new(array![[0.0, 4.0], [4.0, 0.0]]).unwrap();
    /// assert_eq!(d.size(), 2);
    /// ```
    pub fn new(matrix: Array2<f64>) -> Result<Self> {
        Self::with_tolerances(matrix, ValidationTolerances::default())
    }

    /// Validates `matrix` with explicit tolerances.
    pub fn with_tolerances(matrix: Array2<f64>, tolerances: ValidationTolerances) -> Result<Self> {
        validate_tolerance(tolerances.symmetry, "symmetry")?;
        validate_tolerance(tolerances.diagonal, "diagonal")?;

        let (nrows, ncols) = matrix.dim();
        if nrows != ncols {
            return Err(MdsError::input_shape(format!(
                "Dissimilarity matrix must be square, got {}x{}",
                nrows, ncols
            )));
        }
        if nrows <= 1 {
            return Err(MdsError::DegenerateInput { size: nrows });
        }
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(MdsError::NonFinite { stage: "dissimilarity matrix" });
        }
        if let Some((i, v)) = matrix
            .diag()
            .iter()
            .enumerate()
            .find(|(_, v)| v.abs() > tolerances.diagonal)
        {
            return Err(MdsError::input_shape(format!(
                "Dissimilarity matrix diagonal must be zero, found {} at ({}, {})",
                v, i, i
            )));
        }
        if let Some(((i, j), v)) = matrix.indexed_iter().find(|(_, v)| **v < 0.0) {
            return Err(MdsError::input_shape(format!(
                "Dissimilarity matrix entries must be non-negative, found {} at ({}, {})",
                v, i, j
            )));
        }
        if let Some((i, j)) = first_asymmetric_pair(matrix.view(), tolerances.symmetry) {
            return Err(MdsError::input_shape(format!(
                "Dissimilarity matrix must be symmetric, D[{i}][{j}] = {} but D[{j}][{i}] = {}",
                matrix[[i, j]],
                matrix[[j, i]]
            )));
        }

        trace!("Validated {}x{} dissimilarity matrix.", nrows, ncols);
        Ok(Self { data: matrix })
    }

    /// Number of observations M.
    pub fn size(&self) -> usize {
        self.data.nrows()
    }

    /// Read-only view of the squared dissimilarities.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Consumes the wrapper and returns the underlying matrix.
    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }
}

fn validate_tolerance(value: f64, name: &str) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(MdsError::input_shape(format!(
            "{} tolerance must be finite and non-negative, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Returns the first `(i, j)` with `j > i` in row-major order whose mirrored entries differ
/// by more than the relative tolerance. Rows are scanned in parallel.
fn first_asymmetric_pair(
    matrix: ArrayView2<'_, f64>,
    tolerance: f64,
) -> Option<(usize, usize)> {
    let m = matrix.nrows();
    (0..m).into_par_iter().find_map_first(|i| {
        ((i + 1)..m).find_map(|j| {
            let a = matrix[[i, j]];
            let b = matrix[[j, i]];
            let scale = a.abs().max(b.abs()).max(f64::MIN_POSITIVE);
            if approx_eq!(f64, a, b, epsilon = tolerance * scale) {
                None
            } else {
                Some((i, j))
            }
        })
    })
}
