//! Error types for classical multidimensional scaling.

use thiserror::Error;

/// Failure modes of an MDS computation.
///
/// Every failure is deterministic for a given input, so none of them are worth retrying
/// without changing the input or the configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MdsError {
    /// The dissimilarity matrix or a requested dimension violates a shape or value constraint.
    #[error("Invalid input shape or value: {0}")]
    InputShape(String),

    /// Fewer than two observations; no low-dimensional arrangement carries information.
    #[error("Degenerate input: need at least 2 observations, got {size}")]
    DegenerateInput { size: usize },

    /// A selected eigenvalue is negative, so its square root is undefined over the reals.
    #[error(
        "Non-Euclidean spectrum: eigenvalue {eigenvalue:e} of component {} is negative",
        .component + 1
    )]
    NonEuclideanSpectrum { component: usize, eigenvalue: f64 },

    /// NaN or infinity appeared in the input or in an intermediate result.
    #[error("Non-finite values encountered in {stage}")]
    NonFinite { stage: &'static str },

    /// The eigensolver backend reported a failure.
    #[error("Eigensolver backend error: {0}")]
    Backend(String),

    /// Saving or loading an embedding failed.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Result type alias for MDS operations.
pub type Result<T> = std::result::Result<T, MdsError>;

impl MdsError {
    /// Create an input shape error.
    #[must_use]
    pub fn input_shape(msg: impl Into<String>) -> Self {
        Self::InputShape(msg.into())
    }

    /// Create a backend error.
    #[must_use]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a persistence error.
    #[must_use]
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }
}
