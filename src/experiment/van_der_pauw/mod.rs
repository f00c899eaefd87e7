//! Van der Pauw resistivity measurement.
//!
//! A four-point measurement that bypasses the resistance of ohmic contacts. Readings
//! taken in the eight contact configurations are classified onto two axes by
//! permutation parity, averaged per axis, and solved for the sheet resistance.

pub mod geometry;
pub mod measurement;
pub mod solve;

pub use geometry::{Axis, Geometry, ParseGeometryError};
pub use measurement::{MeasurementRow, MeasurementTable};
pub use solve::{
    analyze, analyze_with, implicit_formula, square_approximation, universal_solve,
    universal_solve_with, SolveReport, SolverConfig,
};

use std::borrow::Cow;

use tracing::debug;

use crate::electricity;
use crate::experiment::Experiment;
use crate::math::Scalar;

/// Errors raised while validating or analysing a Van der Pauw measurement.
#[derive(Debug, thiserror::Error)]
pub enum VanDerPauwError {
    /// Mandatory columns are absent or inconsistent.
    #[error("schema error: {0}")]
    Schema(String),
    /// The CSV input could not be read.
    #[error("failed to read measurement table: {0}")]
    Csv(#[from] csv::Error),
    /// A row's geometry label names no known configuration.
    #[error("row {row}: {source}")]
    InvalidGeometry {
        /// Zero-based row index.
        row: usize,
        /// Parse failure for the label.
        source: ParseGeometryError,
    },
    /// Resistance could not be computed because the current is zero.
    #[error("row {row}: resistance is undefined for zero current")]
    DivisionByZero {
        /// Zero-based row index.
        row: usize,
    },
    /// Ohm's law produced an infinite or NaN resistance.
    #[error("row {row}: resistance from voltage and current is not finite")]
    NonFiniteResistance {
        /// Zero-based row index.
        row: usize,
    },
    /// A row has no resistance although averaging was requested.
    #[error("row {row}: resistance missing, compute it from voltage and current first")]
    MissingResistance {
        /// Zero-based row index.
        row: usize,
    },
    /// No row was classified onto one of the axes.
    #[error("no measurement classified as {axis}, the {axis} resistance is undefined")]
    EmptyGroup {
        /// Axis without rows.
        axis: Axis,
    },
    /// An axis resistance is zero, negative or not finite.
    #[error("{axis} resistance must be positive and finite, got {value}")]
    NonPositiveResistance {
        /// Offending axis.
        axis: Axis,
        /// Offending mean resistance in ohms.
        value: Scalar,
    },
    /// The sheet-resistance seed is not a positive finite number.
    #[error("sheet resistance seed must be positive and finite, got {0}")]
    InvalidSeed(Scalar),
    /// The secant iteration did not settle on the sheet resistance.
    #[error(
        "sheet resistance did not converge after {iterations} iterations \
         (last estimate {last_estimate:.6e} ohm/sq, residual {residual:.2e})"
    )]
    Convergence {
        /// Iterations completed.
        iterations: usize,
        /// Final estimate in ohms per square.
        last_estimate: Scalar,
        /// Implicit formula value at the final estimate.
        residual: Scalar,
    },
    /// Sample thickness is not a positive finite length.
    #[error("sample thickness must be positive and finite, got {0} m")]
    InvalidThickness(Scalar),
}

/// Options for [`process_with`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProcessOptions {
    /// Sample thickness in metres; enables resistivity and conductivity.
    pub thickness: Option<Scalar>,
    /// Root finder settings.
    pub solver: SolverConfig,
}

impl ProcessOptions {
    /// Default options: no thickness, default solver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sample thickness in metres.
    #[must_use]
    pub const fn with_thickness(mut self, thickness: Scalar) -> Self {
        self.thickness = Some(thickness);
        self
    }

    /// Replaces the solver configuration.
    #[must_use]
    pub const fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }
}

/// Derived quantities of one Van der Pauw measurement.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VanDerPauwResults {
    /// Sheet resistance in ohms per square.
    pub sheet_resistance: Scalar,
    /// `max(R_h, R_v) / min(R_h, R_v)`, at least one.
    pub ratio_resistance: Scalar,
    /// Sheet conductance in siemens per square.
    pub sheet_conductance: Scalar,
    /// Resistivity in ohm-metres, when the thickness is known.
    pub resistivity: Option<Scalar>,
    /// Conductivity in siemens per metre, when the thickness is known.
    pub conductivity: Option<Scalar>,
}

/// Analyses `table` with the default solver, deriving bulk quantities when
/// `thickness` (m) is given.
pub fn process(
    table: &MeasurementTable,
    thickness: Option<Scalar>,
) -> Result<VanDerPauwResults, VanDerPauwError> {
    let options = ProcessOptions {
        thickness,
        ..ProcessOptions::default()
    };
    process_with(table, &options)
}

/// Analyses `table`.
///
/// Missing resistances are computed on a private copy; the caller's table is not
/// modified.
pub fn process_with(
    table: &MeasurementTable,
    options: &ProcessOptions,
) -> Result<VanDerPauwResults, VanDerPauwError> {
    if let Some(t) = options.thickness {
        if !(t.is_finite() && t > 0.0) {
            return Err(VanDerPauwError::InvalidThickness(t));
        }
    }

    let table = if table.resistance_missing() {
        Cow::Owned(table.clone().with_computed_resistances()?)
    } else {
        Cow::Borrowed(table)
    };
    let (rh, rv) = table.group_and_average()?;
    debug!(rh, rv, "axis resistances");

    let (sheet_resistance, ratio_resistance) = analyze_with(rh, rv, &options.solver)?;
    let resistivity = options
        .thickness
        .map(|t| electricity::resistivity_from_sheet_resistance(sheet_resistance, t));

    Ok(VanDerPauwResults {
        sheet_resistance,
        ratio_resistance,
        sheet_conductance: electricity::sheet_conductance(sheet_resistance),
        resistivity,
        conductivity: resistivity.map(electricity::conductivity),
    })
}

/// Van der Pauw experiment for batch processing with [`crate::experiment::process_all`].
#[derive(Debug, Clone, Copy, Default)]
pub struct VanDerPauw {
    /// Options applied to every sample.
    pub options: ProcessOptions,
}

impl VanDerPauw {
    /// Creates the experiment with the given options.
    #[must_use]
    pub const fn new(options: ProcessOptions) -> Self {
        Self { options }
    }
}

impl Experiment for VanDerPauw {
    type Input = MeasurementTable;
    type Output = VanDerPauwResults;
    type Error = VanDerPauwError;

    fn process(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        process_with(input, &self.options)
    }
}
