//! Convenience re-exports for analysing laboratory measurements.

pub use crate::constants::*;
pub use crate::curves::HysteresisLoop;
pub use crate::errors::PhysicsLabError;
pub use crate::experiment::hall::{
    ConductivityType, Hall, HallError, HallMeasurement, HallResults, HallRow, SheetDensityFit,
};
pub use crate::experiment::magnetization::{
    lateral_linear_fit, LinearBackground, Magnetization, MagnetizationError,
    MagnetizationMeasurement, MagnetizationOptions, MagnetizationResults, MagnetizationRow,
    MagnetizationSource,
};
pub use crate::experiment::van_der_pauw::{
    analyze, analyze_with, implicit_formula, square_approximation, universal_solve,
    universal_solve_with, Axis, Geometry, MeasurementRow, MeasurementTable, ParseGeometryError,
    ProcessOptions, SolveReport, SolverConfig, VanDerPauw, VanDerPauwError, VanDerPauwResults,
};
pub use crate::experiment::{process_all, Experiment, Sample, SampleOutcome};
pub use crate::math::{
    curve_fit, linear_fit, mean, permutation_sign, CurveFit, CurveFitConfig, LinearFit, Scalar,
};
