// Classical multidimensional scaling (Torgerson/Gower)

use crate::centering::double_center;
use crate::dissimilarity::{DissimilarityMatrix, ValidationTolerances};
use crate::error::{MdsError, Result};
use crate::projection::{assemble, NegativeEigenvaluePolicy};
use crate::spectral::decompose;
use log::{debug, info, warn};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

/// Configuration for a classical MDS run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassicalMdsConfig {
    /// Target dimension `d` of the embedding. Must lie in `[1, M]` at fit time.
    pub n_components: usize,
    /// Handling of selected eigenvalues that are negative beyond numerical noise.
    pub negative_eigenvalue_policy: NegativeEigenvaluePolicy,
    /// Relative tolerance when checking the input for symmetry, scaled by `max(|D_ij|, |D_ji|)`.
    pub symmetry_tolerance: f64,
    /// Absolute tolerance when checking that the input diagonal is zero.
    pub diagonal_tolerance: f64,
    /// Selected eigenvalues in `[-tol * max|λ|, 0)` are treated as exact zeros.
    pub eigenvalue_noise_tolerance: f64,
}

impl Default for ClassicalMdsConfig {
    fn default() -> Self {
        ClassicalMdsConfig {
            n_components: 2,
            negative_eigenvalue_policy: NegativeEigenvaluePolicy::Fail,
            symmetry_tolerance: 1e-9,
            diagonal_tolerance: 1e-9,
            eigenvalue_noise_tolerance: 1e-9,
        }
    }
}

impl ClassicalMdsConfig {
    /// Convenience constructor for `d` components with default tolerances.
    pub fn with_components(n_components: usize) -> Self {
        Self {
            n_components,
            ..Self::default()
        }
    }

    /// Checks the configuration independent of any input.
    ///
    /// # Errors
    /// `InputShape` for zero components or tolerances that are negative or non-finite.
    pub fn validate(&self) -> Result<()> {
        if self.n_components == 0 {
            return Err(MdsError::input_shape("n_components must be at least 1"));
        }
        for (name, value) in [
            ("symmetry_tolerance", self.symmetry_tolerance),
            ("diagonal_tolerance", self.diagonal_tolerance),
            ("eigenvalue_noise_tolerance", self.eigenvalue_noise_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(MdsError::input_shape(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Input validation tolerances derived from this configuration.
    pub fn validation_tolerances(&self) -> ValidationTolerances {
        ValidationTolerances {
            symmetry: self.symmetry_tolerance,
            diagonal: self.diagonal_tolerance,
        }
    }
}

/// Runs the classical MDS pipeline: double centering, symmetric eigendecomposition and
/// projection onto the dominant eigenpairs.
///
/// The computation is synchronous and holds no state between calls, so a single instance
/// can be shared across threads to embed independent datasets.
#[derive(Clone, Debug, Default)]
pub struct ClassicalMds {
    config: ClassicalMdsConfig,
}

impl ClassicalMds {
    /// Creates a new runner with the given configuration.
    pub fn new(config: ClassicalMdsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassicalMdsConfig {
        &self.config
    }

    /// Validates a raw matrix with the configured tolerances and embeds it.
    ///
    /// # Errors
    /// Any validation error from [`DissimilarityMatrix::with_tolerances`], plus everything
    /// [`Self::fit`] can return.
    ///
    /// # Examples
    ///
    /// ```
    /// use classical_mds::{ClassicalMds, ClassicalMdsConfig};
    /// use ndarray::array;
    ///
    /// // Squared distances of three points on a line at 0, 1 and 3.
    /// let d = array![[0.0, 1.0, 9.0], [1.0, 0.0, 4.0], [9.0, 4.0, 0.0]];
    /// let mds = ClassicalMds::new(ClassicalMdsConfig::with_components(1));
    /// let embedding = mds.fit_array(d).unwrap();
    /// assert_eq!(embedding.coordinates().dim(), (3, 1));
    /// ```
    pub fn fit_array(&self, dissimilarities: Array2<f64>) -> Result<MdsEmbedding> {
        self.config.validate()?;
        let matrix = DissimilarityMatrix::with_tolerances(
            dissimilarities,
            self.config.validation_tolerances(),
        )?;
        self.fit(&matrix)
    }

    /// Embeds the observations behind `dissimilarities` into `n_components` dimensions.
    ///
    /// Either the full embedding is produced or the call fails as a whole.
    ///
    /// # Errors
    /// - `InputShape` if `n_components` is outside `[1, M]` or the configuration is invalid.
    /// - `NonEuclideanSpectrum` if a selected eigenvalue is negative under the `Fail` policy.
    /// - `NonFinite` if any stage produces NaN or infinity.
    /// - `Backend` if the eigensolver fails.
    pub fn fit(&self, dissimilarities: &DissimilarityMatrix) -> Result<MdsEmbedding> {
        self.config.validate()?;
        let m = dissimilarities.size();
        let d = self.config.n_components;

        info!(
            "Starting classical MDS. Observations={}, Target dimension={}, Policy={:?}",
            m, d, self.config.negative_eigenvalue_policy
        );
        if d > m {
            return Err(MdsError::input_shape(format!(
                "Requested dimension must lie in [1, {}], got {}",
                m, d
            )));
        }
        let overall_start_time = Instant::now();

        let centering_start_time = Instant::now();
        let centered = double_center(dissimilarities)?;
        debug!("Double-centered dissimilarity matrix in {:?}", centering_start_time.elapsed());

        let decomposition_start_time = Instant::now();
        let spectrum = decompose(&centered)?;
        drop(centered);
        info!("Computed symmetric eigendecomposition in {:?}", decomposition_start_time.elapsed());

        let negative_count = spectrum.negative_count();
        if negative_count > 0 {
            let most_negative = spectrum.eigenvalues()[spectrum.len() - 1];
            debug!(
                "Centered matrix has {} negative eigenvalue(s), most negative {:e}",
                negative_count, most_negative
            );
        }

        let projection = assemble(
            &spectrum,
            d,
            self.config.negative_eigenvalue_policy,
            self.config.eigenvalue_noise_tolerance,
        )?;

        let (full_spectrum, _) = spectrum.into_parts();
        let proportion_explained = proportion_explained(&projection.eigenvalues, &full_spectrum);
        if proportion_explained.iter().all(|&p| p == 0.0) {
            warn!("None of the {} selected components carries positive variance.", d);
        }

        info!(
            "Classical MDS finished in {:?}. Selected eigenvalues: {:?}",
            overall_start_time.elapsed(),
            projection.eigenvalues
        );

        Ok(MdsEmbedding {
            coordinates: projection.coordinates,
            eigenvalues: projection.eigenvalues,
            full_spectrum,
            proportion_explained,
        })
    }
}

/// `λ_k / Σ_{λ>0} λ` for each selected eigenvalue; zero for non-positive ones.
fn proportion_explained(selected: &Array1<f64>, full_spectrum: &Array1<f64>) -> Array1<f64> {
    let positive_total: f64 = full_spectrum.iter().filter(|&&v| v > 0.0).sum();
    if positive_total <= 0.0 {
        return Array1::zeros(selected.len());
    }
    selected.mapv(|v| if v > 0.0 { v / positive_total } else { 0.0 })
}

/// The result of a classical MDS fit.
///
/// Can be saved to and loaded from disk with bincode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MdsEmbedding {
    /// Shape: (n_observations, n_components)
    coordinates: Array2<f64>,
    /// Selected eigenvalues, unclamped. Shape: (n_components)
    eigenvalues: Array1<f64>,
    /// All eigenvalues of the centered matrix, descending. Shape: (n_observations)
    full_spectrum: Array1<f64>,
    /// Shape: (n_components)
    proportion_explained: Array1<f64>,
}

impl MdsEmbedding {
    /// Low-dimensional coordinates; row i belongs to observation i.
    pub fn coordinates(&self) -> &Array2<f64> {
        &self.coordinates
    }

    /// Consumes the result and returns the coordinate matrix.
    pub fn into_coordinates(self) -> Array2<f64> {
        self.coordinates
    }

    /// The eigenvalues behind each embedding column, as decomposed.
    pub fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    /// Every eigenvalue of the centered matrix, largest first.
    pub fn full_spectrum(&self) -> &Array1<f64> {
        &self.full_spectrum
    }

    /// Share of the positive spectrum carried by each embedding column.
    pub fn proportion_explained(&self) -> &Array1<f64> {
        &self.proportion_explained
    }

    pub fn n_observations(&self) -> usize {
        self.coordinates.nrows()
    }

    pub fn n_components(&self) -> usize {
        self.coordinates.ncols()
    }

    /// Squared Euclidean distances between embedded points, comparable to the input matrix.
    pub fn pairwise_squared_distances(&self) -> Array2<f64> {
        let gram = self.coordinates.dot(&self.coordinates.t());
        let norms = gram.diag().to_owned();
        let mut distances = gram.mapv(|g| -2.0 * g);
        distances += &norms.view().insert_axis(Axis(1));
        distances += &norms.view().insert_axis(Axis(0));
        distances.mapv_inplace(|v| v.max(0.0));
        distances.diag_mut().fill(0.0);
        distances
    }

    /// Saves the embedding to a file using bincode.
    ///
    /// # Errors
    /// `Persistence` if the file cannot be created, serialization fails, or the buffered
    /// bytes cannot be flushed to disk.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref()).map_err(|e| {
            MdsError::persistence(format!("Failed to create file at {:?}: {}", path.as_ref(), e))
        })?;
        let mut writer = BufWriter::new(file);
        bincode::serde::encode_into_std_write(self, &mut writer, bincode::config::standard())
            .map_err(|e| {
                MdsError::persistence(format!("Failed to serialize MDS embedding: {}", e))
            })?;
        // Dropping a BufWriter discards flush errors.
        writer.flush().map_err(|e| {
            MdsError::persistence(format!("Failed to write file at {:?}: {}", path.as_ref(), e))
        })?;
        Ok(())
    }

    /// Loads an embedding previously written by [`Self::save`] and checks it is consistent.
    ///
    /// # Errors
    /// `Persistence` if the file cannot be read, decoding fails, or the decoded arrays have
    /// mismatched shapes or non-finite values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref()).map_err(|e| {
            MdsError::persistence(format!("Failed to open file at {:?}: {}", path.as_ref(), e))
        })?;
        let mut reader = BufReader::new(file);
        let embedding: MdsEmbedding =
            bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())
                .map_err(|e| {
                    MdsError::persistence(format!("Failed to deserialize MDS embedding: {}", e))
                })?;
        embedding.check_consistency()?;
        Ok(embedding)
    }

    fn check_consistency(&self) -> Result<()> {
        let (m, d) = self.coordinates.dim();
        if self.eigenvalues.len() != d || self.proportion_explained.len() != d {
            return Err(MdsError::persistence(format!(
                "Loaded embedding has {} columns but {} eigenvalues and {} explained proportions",
                d,
                self.eigenvalues.len(),
                self.proportion_explained.len()
            )));
        }
        if self.full_spectrum.len() != m {
            return Err(MdsError::persistence(format!(
                "Loaded embedding has {} observations but a spectrum of length {}",
                m,
                self.full_spectrum.len()
            )));
        }
        let all_finite = self
            .coordinates
            .iter()
            .chain(self.eigenvalues.iter())
            .chain(self.full_spectrum.iter())
            .chain(self.proportion_explained.iter())
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(MdsError::persistence("Loaded embedding contains non-finite values"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_config_defaults_and_validation() {
        let config = ClassicalMdsConfig::default();
        assert_eq!(config.n_components, 2);
        assert_eq!(config.negative_eigenvalue_policy, NegativeEigenvaluePolicy::Fail);
        assert!(config.validate().is_ok());

        assert!(ClassicalMdsConfig::with_components(0).validate().is_err());
        let bad = ClassicalMdsConfig {
            eigenvalue_noise_tolerance: f64::INFINITY,
            ..ClassicalMdsConfig::default()
        };
        assert!(matches!(bad.validate(), Err(MdsError::InputShape(_))));
    }

    #[test]
    fn test_proportion_explained() {
        let full = array![6.0, 3.0, 1.0, -2.0];
        let p = proportion_explained(&array![6.0, 3.0], &full);
        assert_abs_diff_eq!(p[0], 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(p[1], 0.3, epsilon = 1e-12);

        let p = proportion_explained(&array![-1.0], &array![-1.0, -2.0]);
        assert_eq!(p[0], 0.0);
    }

    #[test]
    fn test_fit_rejects_dimension_above_size() {
        let d = DissimilarityMatrix::new(array![[0.0, 1.0], [1.0, 0.0]]).unwrap();
        let mds = ClassicalMds::new(ClassicalMdsConfig::with_components(3));
        assert!(matches!(mds.fit(&d), Err(MdsError::InputShape(_))));
    }

    #[test]
    fn test_two_points_one_dimension() {
        let d = DissimilarityMatrix::new(array![[0.0, 4.0], [4.0, 0.0]]).unwrap();
        let embedding = ClassicalMds::new(ClassicalMdsConfig::with_components(1))
            .fit(&d)
            .unwrap();
        let x = embedding.coordinates();
        assert_abs_diff_eq!((x[[0, 0]] - x[[1, 0]]).abs(), 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(x[[0, 0]] + x[[1, 0]], 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(embedding.eigenvalues()[0], 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(embedding.proportion_explained()[0], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_pairwise_squared_distances_of_embedding() {
        let embedding = MdsEmbedding {
            coordinates: array![[0.0, 0.0], [3.0, 4.0], [1.0, 0.0]],
            eigenvalues: array![1.0, 1.0],
            full_spectrum: array![1.0, 1.0, 0.0],
            proportion_explained: array![0.5, 0.5],
        };
        let dist = embedding.pairwise_squared_distances();
        assert_abs_diff_eq!(dist[[0, 1]], 25.0, epsilon = 1e-12);
        assert_abs_diff_eq!(dist[[1, 2]], 20.0, epsilon = 1e-12);
        assert_abs_diff_eq!(dist[[2, 0]], 1.0, epsilon = 1e-12);
        assert_eq!(dist[[1, 1]], 0.0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_save_reports_write_failure() {
        // Writes to /dev/full fail with ENOSPC once the buffer is flushed.
        let embedding = MdsEmbedding {
            coordinates: Array2::zeros((10, 2)),
            eigenvalues: array![1.0, 0.5],
            full_spectrum: Array1::zeros(10),
            proportion_explained: array![0.5, 0.25],
        };
        let result = embedding.save("/dev/full");
        assert!(
            matches!(result, Err(MdsError::Persistence(_))),
            "expected Persistence error, got {:?}",
            result
        );
    }

    #[test]
    fn test_check_consistency_rejects_mismatched_shapes() {
        let embedding = MdsEmbedding {
            coordinates: Array2::zeros((3, 2)),
            eigenvalues: array![1.0],
            full_spectrum: array![1.0, 0.0, 0.0],
            proportion_explained: array![1.0, 0.0],
        };
        assert!(matches!(embedding.check_consistency(), Err(MdsError::Persistence(_))));
    }
}
