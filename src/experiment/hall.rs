//! Hall effect measurement.
//!
//! The Hall resistance `R_H = V_H / I` of a thin sample grows linearly with the
//! perpendicular magnetic field, `R_H = B / (q n_s)`. Fitting `B` against `R_H` gives
//! the sheet carrier density and, from the sign, the majority carrier type.

use std::fmt;
use std::io::Read;

use tracing::debug;

use crate::constants::ELEMENTARY_CHARGE;
use crate::electricity::{carrier_concentration, mobility_from_sheets, resistance_from_ohms_law};
use crate::experiment::Experiment;
use crate::math::{linear_fit, Scalar};

/// Column headers recognised by [`HallMeasurement::from_csv_reader`].
pub mod columns {
    /// Magnetic field in tesla.
    pub const MAGNETIC_FIELD: &str = "B";
    /// Hall voltage in volts.
    pub const HALL_VOLTAGE: &str = "VH";
    /// Current in amperes.
    pub const CURRENT: &str = "I";
}

/// Errors raised by the Hall analysis.
#[derive(Debug, thiserror::Error)]
pub enum HallError {
    /// Mandatory columns are absent or malformed.
    #[error("schema error: {0}")]
    Schema(String),
    /// The CSV input could not be read.
    #[error("failed to read hall measurement: {0}")]
    Csv(#[from] csv::Error),
    /// Hall resistance is undefined for zero current.
    #[error("row {row}: hall resistance is undefined for zero current")]
    DivisionByZero {
        /// Zero-based row index.
        row: usize,
    },
    /// Too few distinct points to fit a line.
    #[error("sheet density needs at least two distinct hall resistances, got {rows} rows")]
    InsufficientData {
        /// Number of rows supplied.
        rows: usize,
    },
}

/// Majority carrier type.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConductivityType {
    /// Holes.
    P,
    /// Electrons.
    N,
}

impl fmt::Display for ConductivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P => f.write_str("p"),
            Self::N => f.write_str("n"),
        }
    }
}

/// One field step.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HallRow {
    /// Magnetic field in tesla.
    pub magnetic_field: Scalar,
    /// Hall voltage in volts.
    pub hall_voltage: Scalar,
    /// Current in amperes.
    pub current: Scalar,
}

/// Sheet density fit of a Hall sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetDensityFit {
    /// Sheet carrier density in m⁻².
    pub sheet_density: Scalar,
    /// Majority carrier type.
    pub conductivity_type: ConductivityType,
    /// Sum of squared residuals of the linear fit, in T².
    pub residual: Scalar,
}

/// Derived quantities of one Hall measurement.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HallResults {
    /// Sheet carrier density in m⁻².
    pub sheet_density: Scalar,
    /// Majority carrier type.
    pub conductivity_type: ConductivityType,
    /// Sum of squared residuals of the linear fit.
    pub residual: Scalar,
    /// Carrier concentration in m⁻³, when the thickness is known.
    pub concentration: Option<Scalar>,
    /// Mobility in m²/(V·s), when the sheet resistance is known.
    pub mobility: Option<Scalar>,
}

/// Hall voltage readings over a magnetic field sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HallMeasurement {
    rows: Vec<HallRow>,
}

impl HallMeasurement {
    /// Wraps already typed rows.
    #[must_use]
    pub const fn new(rows: Vec<HallRow>) -> Self {
        Self { rows }
    }

    /// Reads a CSV table with `B`, `VH` and `I` columns.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, HallError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let require = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| HallError::Schema(format!("missing mandatory column {name:?}")))
        };
        let b_idx = require(columns::MAGNETIC_FIELD)?;
        let vh_idx = require(columns::HALL_VOLTAGE)?;
        let i_idx = require(columns::CURRENT)?;

        let mut rows = Vec::new();
        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            let number = |idx: usize, name: &str| {
                let cell = record.get(idx).unwrap_or("");
                cell.parse::<Scalar>().map_err(|_| {
                    HallError::Schema(format!(
                        "row {row}: column {name} holds {cell:?}, not a number"
                    ))
                })
            };
            rows.push(HallRow {
                magnetic_field: number(b_idx, columns::MAGNETIC_FIELD)?,
                hall_voltage: number(vh_idx, columns::HALL_VOLTAGE)?,
                current: number(i_idx, columns::CURRENT)?,
            });
        }
        Ok(Self { rows })
    }

    /// Rows in insertion order.
    #[must_use]
    pub fn rows(&self) -> &[HallRow] {
        &self.rows
    }

    /// Hall resistance `V_H / I` of every row.
    pub fn hall_resistances(&self) -> Result<Vec<Scalar>, HallError> {
        self.rows
            .iter()
            .enumerate()
            .map(|(row, r)| {
                if r.current == 0.0 {
                    Err(HallError::DivisionByZero { row })
                } else {
                    Ok(resistance_from_ohms_law(r.hall_voltage, r.current))
                }
            })
            .collect()
    }

    /// Fits `B = a + s · R_H`; the signed density is `s / -e`.
    pub fn solve_for_sheet_density(&self) -> Result<SheetDensityFit, HallError> {
        let hall_resistance = self.hall_resistances()?;
        let field: Vec<Scalar> = self.rows.iter().map(|r| r.magnetic_field).collect();
        let fit = linear_fit(&hall_resistance, &field).ok_or(HallError::InsufficientData {
            rows: self.rows.len(),
        })?;

        let signed_sheet_density = fit.slope / -ELEMENTARY_CHARGE;
        let conductivity_type = if signed_sheet_density > 0.0 {
            ConductivityType::P
        } else {
            ConductivityType::N
        };
        debug!(
            slope = fit.slope,
            residual = fit.residual,
            %conductivity_type,
            "hall fit"
        );
        Ok(SheetDensityFit {
            sheet_density: signed_sheet_density.abs(),
            conductivity_type,
            residual: fit.residual,
        })
    }
}

/// Analyses a Hall sweep. `thickness` (m) enables the concentration and
/// `sheet_resistance` (Ω/□, e.g. from a Van der Pauw measurement) enables the mobility.
pub fn process(
    measurement: &HallMeasurement,
    thickness: Option<Scalar>,
    sheet_resistance: Option<Scalar>,
) -> Result<HallResults, HallError> {
    let fit = measurement.solve_for_sheet_density()?;
    Ok(HallResults {
        sheet_density: fit.sheet_density,
        conductivity_type: fit.conductivity_type,
        residual: fit.residual,
        concentration: thickness.map(|t| carrier_concentration(fit.sheet_density, t)),
        mobility: sheet_resistance.map(|rs| mobility_from_sheets(fit.sheet_density, rs)),
    })
}

/// Hall experiment for batch processing with [`crate::experiment::process_all`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Hall {
    /// Sample thickness in metres.
    pub thickness: Option<Scalar>,
    /// Sheet resistance in ohms per square.
    pub sheet_resistance: Option<Scalar>,
}

impl Experiment for Hall {
    type Input = HallMeasurement;
    type Output = HallResults;
    type Error = HallError;

    fn process(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        process(input, self.thickness, self.sheet_resistance)
    }
}
