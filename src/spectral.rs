//! Symmetric eigendecomposition of the double-centered matrix.

use crate::error::{MdsError, Result};
use crate::linalg_backends::{BackendEigh, LinAlgBackendProvider};
use log::{debug, trace};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Eigenpairs of a symmetric matrix, ordered by descending eigenvalue.
///
/// `eigenvectors.column(k)` is the unit-norm eigenvector belonging to `eigenvalues[k]`.
/// Negative eigenvalues are kept as computed; deciding what to do with them is left to
/// [`crate::projection::assemble`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EigenSpectrum {
    eigenvalues: Array1<f64>,
    eigenvectors: Array2<f64>,
}

impl EigenSpectrum {
    /// Builds a spectrum from already-sorted eigenpairs.
    ///
    /// # Errors
    /// `InputShape` when the eigenvector matrix is not `M x M` for `M` eigenvalues or the
    /// eigenvalues are not in descending order.
    pub fn new(eigenvalues: Array1<f64>, eigenvectors: Array2<f64>) -> Result<Self> {
        let m = eigenvalues.len();
        if eigenvectors.dim() != (m, m) {
            return Err(MdsError::input_shape(format!(
                "Eigenvector matrix must be {}x{} for {} eigenvalues, got {:?}",
                m,
                m,
                m,
                eigenvectors.dim()
            )));
        }
        if eigenvalues.windows(2).into_iter().any(|w| w[0] < w[1]) {
            return Err(MdsError::input_shape("Eigenvalues must be sorted in descending order"));
        }
        Ok(Self { eigenvalues, eigenvectors })
    }

    /// Eigenvalues, largest first.
    pub fn eigenvalues(&self) -> ArrayView1<'_, f64> {
        self.eigenvalues.view()
    }

    /// Eigenvectors as columns, in the same order as [`Self::eigenvalues`].
    pub fn eigenvectors(&self) -> ArrayView2<'_, f64> {
        self.eigenvectors.view()
    }

    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    /// Number of strictly positive eigenvalues.
    pub fn positive_count(&self) -> usize {
        self.eigenvalues.iter().filter(|&&v| v > 0.0).count()
    }

    /// Number of strictly negative eigenvalues.
    pub fn negative_count(&self) -> usize {
        self.eigenvalues.iter().filter(|&&v| v < 0.0).count()
    }

    /// Largest absolute eigenvalue, 0 for an empty spectrum.
    pub fn max_abs_eigenvalue(&self) -> f64 {
        self.eigenvalues.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
    }

    pub(crate) fn into_parts(self) -> (Array1<f64>, Array2<f64>) {
        (self.eigenvalues, self.eigenvectors)
    }
}

/// Full symmetric eigendecomposition with eigenvalues sorted in descending order.
///
/// Uses the compile-time selected backend (LAPACK through ndarray-linalg, or faer).
/// Only the upper triangle of `centered` is read by the solver.
///
/// Ties keep the solver's relative order (the sort is stable), so the eigenvector basis chosen
/// for a repeated eigenvalue is deterministic for a fixed input and backend.
///
/// # Errors
/// - `InputShape` for a non-square or empty matrix.
/// - `NonFinite` if the input or the solver output contains NaN or infinity.
/// - `Backend` if the solver fails or returns a zero eigenvector.
pub fn decompose(centered: &Array2<f64>) -> Result<EigenSpectrum> {
    let (nrows, ncols) = centered.dim();
    if nrows != ncols {
        return Err(MdsError::input_shape(format!(
            "Centered matrix must be square, got {}x{}",
            nrows, ncols
        )));
    }
    if nrows == 0 {
        return Err(MdsError::input_shape("Centered matrix is empty"));
    }
    if centered.iter().any(|v| !v.is_finite()) {
        return Err(MdsError::NonFinite { stage: "centered matrix" });
    }

    let backend = LinAlgBackendProvider::<f64>::new();
    let eigh = backend.eigh_upper(centered)?;
    if eigh.eigenvalues.len() != nrows || eigh.eigenvectors.dim() != (nrows, nrows) {
        return Err(MdsError::backend(format!(
            "Eigensolver returned {} eigenvalues and a {:?} eigenvector matrix for a {}x{} input",
            eigh.eigenvalues.len(),
            eigh.eigenvectors.dim(),
            nrows,
            nrows
        )));
    }
    if eigh.eigenvalues.iter().chain(eigh.eigenvectors.iter()).any(|v| !v.is_finite()) {
        return Err(MdsError::NonFinite { stage: "eigendecomposition" });
    }

    let mut order: Vec<usize> = (0..nrows).collect();
    order.sort_by(|&a, &b| {
        eigh.eigenvalues[b]
            .partial_cmp(&eigh.eigenvalues[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let eigenvalues = eigh.eigenvalues.select(Axis(0), &order);
    let mut eigenvectors = eigh.eigenvectors.select(Axis(1), &order);

    for (k, mut column) in eigenvectors.axis_iter_mut(Axis(1)).enumerate() {
        let norm = column.dot(&column).sqrt();
        if norm <= f64::EPSILON {
            return Err(MdsError::backend(format!(
                "Eigensolver returned a zero eigenvector for eigenvalue {:e}",
                eigenvalues[k]
            )));
        }
        column.mapv_inplace(|x| x / norm);
    }

    debug!(
        "Eigendecomposition of {}x{} centered matrix: largest eigenvalue {:e}, smallest {:e}",
        nrows,
        nrows,
        eigenvalues[0],
        eigenvalues[nrows - 1]
    );
    trace!("Sorted eigenvalues: {:?}", eigenvalues);

    EigenSpectrum::new(eigenvalues, eigenvectors)
}
