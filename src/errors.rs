//! Shared error types used across submodules.

use thiserror::Error;

use crate::experiment::hall::HallError;
use crate::experiment::magnetization::MagnetizationError;
use crate::experiment::van_der_pauw::VanDerPauwError;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum PhysicsLabError {
    /// Wraps Van der Pauw analysis errors.
    #[error(transparent)]
    VanDerPauw(#[from] VanDerPauwError),
    /// Wraps Hall analysis errors.
    #[error(transparent)]
    Hall(#[from] HallError),
    /// Wraps magnetization analysis errors.
    #[error(transparent)]
    Magnetization(#[from] MagnetizationError),
    /// A named sample failed during batch processing.
    #[error("sample {name:?}: {source}")]
    Sample {
        /// Sample identifier.
        name: String,
        /// Underlying failure.
        source: Box<PhysicsLabError>,
    },
}
