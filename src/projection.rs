//! Assembly of the low-dimensional embedding from the dominant eigenpairs.

use crate::error::{MdsError, Result};
use crate::spectral::EigenSpectrum;
use log::{trace, warn};
use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};

/// What to do with a selected eigenvalue that is negative beyond numerical noise.
///
/// Negative eigenvalues of the centered matrix mean the dissimilarities cannot be realised
/// exactly by points in a Euclidean space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NegativeEigenvaluePolicy {
    /// Abort with [`MdsError::NonEuclideanSpectrum`].
    #[default]
    Fail,
    /// Treat the eigenvalue as zero; the corresponding embedding column is all zeros.
    ZeroOut,
}

/// The assembled embedding together with the eigenvalues that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    /// M×d coordinates; row i belongs to observation i.
    pub coordinates: Array2<f64>,
    /// The d selected eigenvalues exactly as decomposed (not clamped).
    pub eigenvalues: Array1<f64>,
}

/// Forms the M×d embedding `X[:, k] = sqrt(λ_k) v_k` from the `d` largest eigenpairs.
///
/// * `spectrum` - eigenpairs sorted by descending eigenvalue.
/// * `n_components` - target dimension `d`, must lie in `[1, M]`.
/// * `policy` - handling of negative selected eigenvalues.
/// * `noise_tolerance` - eigenvalues in `[-noise_tolerance * max|λ|, 0)` are round-off of
///   a true zero and contribute a zero column under either policy.
///
/// # Errors
/// - `InputShape` for `d == 0`, `d > M` or an invalid tolerance; raised before any work.
/// - `NonEuclideanSpectrum` under [`NegativeEigenvaluePolicy::Fail`], naming the first
///   offending component.
/// - `NonFinite` if the assembled coordinates contain NaN or infinity.
pub fn assemble(
    spectrum: &EigenSpectrum,
    n_components: usize,
    policy: NegativeEigenvaluePolicy,
    noise_tolerance: f64,
) -> Result<Projection> {
    let m = spectrum.len();
    if n_components == 0 || n_components > m {
        return Err(MdsError::input_shape(format!(
            "Requested dimension must lie in [1, {}], got {}",
            m, n_components
        )));
    }
    if !noise_tolerance.is_finite() || noise_tolerance < 0.0 {
        return Err(MdsError::input_shape(format!(
            "Eigenvalue noise tolerance must be finite and non-negative, got {}",
            noise_tolerance
        )));
    }

    let noise_floor = noise_tolerance * spectrum.max_abs_eigenvalue();
    let selected_values = spectrum.eigenvalues().slice_move(s![..n_components]).to_owned();
    let selected_vectors = spectrum.eigenvectors().slice_move(s![.., ..n_components]);

    let mut scales = Array1::<f64>::zeros(n_components);
    for (k, &lambda) in selected_values.iter().enumerate() {
        scales[k] = if lambda >= 0.0 {
            lambda.sqrt()
        } else if lambda >= -noise_floor {
            trace!(
                "Eigenvalue {:e} of component {} is within numerical noise; using 0.",
                lambda,
                k + 1
            );
            0.0
        } else {
            match policy {
                NegativeEigenvaluePolicy::Fail => {
                    return Err(MdsError::NonEuclideanSpectrum {
                        component: k,
                        eigenvalue: lambda,
                    });
                }
                NegativeEigenvaluePolicy::ZeroOut => {
                    warn!(
                        "Eigenvalue {:e} of component {} is negative; zeroing its coordinates.",
                        lambda,
                        k + 1
                    );
                    0.0
                }
            }
        };
    }

    // Column-wise scaling: X = V_d * diag(sqrt(λ_d)).
    let coordinates = &selected_vectors * &scales;

    if coordinates.iter().any(|v| !v.is_finite()) {
        return Err(MdsError::NonFinite { stage: "embedding coordinates" });
    }

    Ok(Projection {
        coordinates,
        eigenvalues: selected_values,
    })
}
