// src/linalg_backends.rs

#[derive(Debug, Default, Copy, Clone)]
pub struct LinAlgBackendProvider<F: 'static + Copy + Send + Sync> {
    _phantom: PhantomData<F>,
}

impl<F: 'static + Copy + Send + Sync> LinAlgBackendProvider<F> {
    pub fn new() -> Self {
        Self { _phantom: PhantomData }
    }
}

// --- Common imports needed by multiple sections ---
use crate::error::{MdsError, Result};
use ndarray::{Array1, Array2};
use std::marker::PhantomData;

// --- Trait Definitions ---

/// Output of a symmetric eigendecomposition.
#[derive(Debug)]
pub struct EighOutput<F: 'static> {
    /// Eigenvalues, in whatever order the solver produced them (LAPACK: ascending).
    pub eigenvalues: Array1<F>,
    /// Eigenvectors as columns of the matrix.
    /// eigenvector_matrix.column(i) corresponds to eigenvalues[i].
    pub eigenvectors: Array2<F>,
}

/// Trait for symmetric eigendecomposition (similar to LAPACK's DSYEVR or DSYEVD).
/// Implementers read only the upper triangle and expect `matrix` to be symmetric.
pub trait BackendEigh<F: 'static + Copy + Send + Sync> {
    fn eigh_upper(&self, matrix: &Array2<F>) -> Result<EighOutput<F>>;
}

// --- NdarrayLinAlgBackend Implementation ---
use ndarray_linalg::{Eigh as NdLinalgEigh, UPLO};

#[derive(Debug, Default, Copy, Clone)]
pub struct NdarrayLinAlgBackend;

impl BackendEigh<f64> for NdarrayLinAlgBackend {
    fn eigh_upper(&self, matrix: &Array2<f64>) -> Result<EighOutput<f64>> {
        if matrix.nrows() != matrix.ncols() {
            return Err(MdsError::input_shape(format!(
                "Matrix must be square for eigendecomposition, got {}x{}",
                matrix.nrows(),
                matrix.ncols()
            )));
        }
        if matrix.is_empty() {
            return Ok(EighOutput {
                eigenvalues: Array1::zeros(0),
                eigenvectors: Array2::zeros((0, 0)),
            });
        }
        let (eigenvalues, eigenvectors) = matrix.eigh(UPLO::Upper).map_err(|e| {
            MdsError::backend(format!("LAPACK symmetric eigendecomposition failed: {}", e))
        })?;
        Ok(EighOutput { eigenvalues, eigenvectors })
    }
}

// --- FaerLinAlgBackend Implementation ---
#[cfg(feature = "backend_faer")]
mod faer_specific_code {
    use super::{BackendEigh, EighOutput};
    use crate::error::{MdsError, Result};
    use ndarray::{Array1, Array2};

    #[derive(Debug, Default, Copy, Clone)]
    pub struct FaerLinAlgBackend;

    impl BackendEigh<f64> for FaerLinAlgBackend {
        fn eigh_upper(&self, matrix: &Array2<f64>) -> Result<EighOutput<f64>> {
            let (nrows, ncols) = matrix.dim();
            if nrows != ncols {
                return Err(MdsError::input_shape(format!(
                    "Matrix must be square for eigendecomposition, got {}x{}",
                    nrows, ncols
                )));
            }
            if matrix.is_empty() {
                return Ok(EighOutput {
                    eigenvalues: Array1::zeros(0),
                    eigenvectors: Array2::zeros((0, 0)),
                });
            }

            // faer::MatRef needs contiguous data; non-standard layouts get a C-order copy.
            let contiguous;
            let slice = match matrix.as_slice() {
                Some(slice) => slice,
                None => {
                    contiguous = matrix.as_standard_layout().into_owned();
                    contiguous.as_slice().ok_or_else(|| {
                        MdsError::backend("Failed to obtain a contiguous copy of the matrix")
                    })?
                }
            };
            let faer_mat_view = faer::MatRef::from_row_major_slice(slice, nrows, ncols);

            let eig = faer_mat_view.self_adjoint_eigen(faer::Side::Upper).map_err(|e| {
                MdsError::backend(format!("Faer self-adjoint eigendecomposition failed: {:?}", e))
            })?;
            let s = eig.S().column_vector();
            let u = eig.U();
            Ok(EighOutput {
                eigenvalues: Array1::from_shape_fn(nrows, |i| s[i]),
                eigenvectors: Array2::from_shape_fn((nrows, ncols), |(i, j)| u[(i, j)]),
            })
        }
    }
}

// --- LinAlgBackendProvider Dispatch ---

/// Dispatches to the selected linear algebra backend based on compile-time feature flags.
impl BackendEigh<f64> for LinAlgBackendProvider<f64> {
    fn eigh_upper(&self, matrix: &Array2<f64>) -> Result<EighOutput<f64>> {
        #[cfg(feature = "backend_faer")]
        {
            faer_specific_code::FaerLinAlgBackend.eigh_upper(matrix)
        }
        #[cfg(not(feature = "backend_faer"))]
        {
            NdarrayLinAlgBackend.eigh_upper(matrix)
        }
    }
}
