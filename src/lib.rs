// Classical multidimensional scaling (MDS)

#![doc = include_str!("../README.md")]

pub mod centering;
pub mod dissimilarity;
pub mod error;
pub mod linalg_backends;
pub mod mds;
pub mod projection;
pub mod spectral;

pub use centering::double_center;
pub use dissimilarity::{DissimilarityMatrix, ValidationTolerances};
pub use error::{MdsError, Result};
pub use mds::{ClassicalMds, ClassicalMdsConfig, MdsEmbedding};
pub use projection::{assemble, NegativeEigenvaluePolicy, Projection};
pub use spectral::{decompose, EigenSpectrum};
