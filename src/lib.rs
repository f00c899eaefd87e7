#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(clippy::all, clippy::cargo, clippy::nursery, missing_docs)]
#![doc = include_str!("../README.md")]

/// Physical and method constants.
pub mod constants;
/// Shared mathematical utilities (scalars, parity, least squares).
pub mod math;
/// Model curves such as the hysteresis loop.
pub mod curves;
/// Electrical quantity conversions.
pub mod electricity;
/// Experiment analyses and the batch driver.
pub mod experiment;
/// Error types shared between submodules.
pub mod errors;

/// Common exports for downstream crates.
pub mod prelude;
