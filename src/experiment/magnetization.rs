//! Magnetization measurement.
//!
//! A magnetization sweep `M(B)` is split into a linear background (diamagnetic or
//! paramagnetic, slope `χ`) and a ferromagnetic hysteresis loop. Each step subtracts its
//! fitted curve from a residual copy of the magnetization, so a later step can work on
//! what the earlier ones left over.

use std::io::Read;

use tracing::debug;

use crate::curves::HysteresisLoop;
use crate::experiment::Experiment;
use crate::math::{curve_fit, linear_fit, CurveFitConfig, LinearFit, Scalar};

/// Column headers recognised by [`MagnetizationMeasurement::from_csv_reader`].
pub mod columns {
    /// Magnetic field.
    pub const MAGNETIC_FIELD: &str = "B";
    /// Magnetization.
    pub const MAGNETIZATION: &str = "M";
}

/// Share of the field range, in percent, fitted at each end by [`lateral_linear_fit`].
pub const DEFAULT_LATERAL_PERCENTAGE: Scalar = 10.0;

/// Errors raised by the magnetization analysis.
#[derive(Debug, thiserror::Error)]
pub enum MagnetizationError {
    /// Mandatory columns are absent or malformed.
    #[error("schema error: {0}")]
    Schema(String),
    /// The CSV input could not be read.
    #[error("failed to read magnetization measurement: {0}")]
    Csv(#[from] csv::Error),
    /// The lateral share is outside `(0, 100]` percent.
    #[error("lateral percentage must lie in (0, 100], got {0}")]
    InvalidPercentage(Scalar),
    /// Too few distinct field values to fit.
    #[error("magnetization fit needs more distinct field values, got {rows} rows")]
    InsufficientData {
        /// Number of rows available to the failing fit.
        rows: usize,
    },
    /// The starting loop cannot be evaluated.
    #[error("hysteresis loop {0:?} is not physical: |remanence| must stay below |saturation|")]
    InvalidInitialGuess(HysteresisLoop),
    /// The hysteresis fit ran out of iterations.
    #[error("hysteresis fit did not converge after {iterations} steps (residual {residual:e})")]
    Convergence {
        /// Steps taken.
        iterations: usize,
        /// Sum of squared residuals at the last estimate.
        residual: Scalar,
    },
}

/// One field step.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnetizationRow {
    /// Applied magnetic field.
    pub magnetic_field: Scalar,
    /// Measured magnetization.
    pub magnetization: Scalar,
}

/// Which magnetization column a fit reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MagnetizationSource {
    /// The measured values.
    Measured,
    /// What earlier fits left over.
    #[default]
    Residual,
}

/// Linear background `M = offset + χ·B`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearBackground {
    /// Magnetic susceptibility `χ`, negative for a diamagnet.
    pub magnetic_susceptibility: Scalar,
    /// Magnetization at zero field.
    pub offset: Scalar,
}

impl LinearBackground {
    /// Background magnetization at `field`.
    #[must_use]
    pub fn eval(&self, field: Scalar) -> Scalar {
        self.offset + self.magnetic_susceptibility * field
    }
}

/// Derived quantities of one magnetization sweep.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnetizationResults {
    /// Slope of the linear background.
    pub magnetic_susceptibility: Scalar,
    /// Offset of the linear background.
    pub offset: Scalar,
    /// Saturation magnetization of the hysteresis loop.
    pub saturation: Scalar,
    /// Remanent magnetization of the hysteresis loop.
    pub remanence: Scalar,
    /// Coercive field of the hysteresis loop.
    pub coercivity: Scalar,
    /// `|background / loop|` at the last field point, infinite if the loop vanishes there.
    pub ratio_dm_fm: Scalar,
}

/// Fits straight lines to the top and bottom `percentage` of the field range and
/// averages their coefficients, skipping a hysteresis loop in the centre.
///
/// The returned `residual` is the sum of both wing residuals.
pub fn lateral_linear_fit(
    x: &[Scalar],
    y: &[Scalar],
    percentage: Scalar,
) -> Result<LinearFit, MagnetizationError> {
    if !(percentage > 0.0 && percentage <= 100.0) {
        return Err(MagnetizationError::InvalidPercentage(percentage));
    }
    let max = x.iter().copied().fold(Scalar::NEG_INFINITY, Scalar::max);
    let min = x.iter().copied().fold(Scalar::INFINITY, Scalar::min);
    let interval = (max - min) * percentage / 100.0;

    let wing = |keep: &dyn Fn(Scalar) -> bool| {
        let (wx, wy): (Vec<Scalar>, Vec<Scalar>) = x
            .iter()
            .zip(y)
            .filter(|(xi, _)| keep(**xi))
            .map(|(xi, yi)| (*xi, *yi))
            .unzip();
        linear_fit(&wx, &wy).ok_or(MagnetizationError::InsufficientData { rows: wx.len() })
    };
    let top = wing(&|xi: Scalar| xi >= max - interval)?;
    let bottom = wing(&|xi: Scalar| xi <= min + interval)?;
    Ok(LinearFit {
        intercept: (top.intercept + bottom.intercept) / 2.0,
        slope: (top.slope + bottom.slope) / 2.0,
        residual: top.residual + bottom.residual,
    })
}

/// Magnetization readings over a field sweep, in sweep order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MagnetizationMeasurement {
    rows: Vec<MagnetizationRow>,
    residual: Vec<Scalar>,
    diamagnetism: Option<Vec<Scalar>>,
    ferromagnetism: Option<Vec<Scalar>>,
}

impl MagnetizationMeasurement {
    /// Wraps typed rows; the residual starts as a copy of the magnetization.
    #[must_use]
    pub fn new(rows: Vec<MagnetizationRow>) -> Self {
        let residual = rows.iter().map(|r| r.magnetization).collect();
        Self {
            rows,
            residual,
            diamagnetism: None,
            ferromagnetism: None,
        }
    }

    /// Reads a CSV table with `B` and `M` columns. Other columns are ignored.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, MagnetizationError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let require = |name: &str| {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                MagnetizationError::Schema(format!("missing mandatory column {name:?}"))
            })
        };
        let b_idx = require(columns::MAGNETIC_FIELD)?;
        let m_idx = require(columns::MAGNETIZATION)?;

        let mut rows = Vec::new();
        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            let number = |idx: usize, name: &str| {
                let cell = record.get(idx).unwrap_or("");
                cell.parse::<Scalar>().map_err(|_| {
                    MagnetizationError::Schema(format!(
                        "row {row}: column {name} holds {cell:?}, not a number"
                    ))
                })
            };
            rows.push(MagnetizationRow {
                magnetic_field: number(b_idx, columns::MAGNETIC_FIELD)?,
                magnetization: number(m_idx, columns::MAGNETIZATION)?,
            });
        }
        Ok(Self::new(rows))
    }

    /// Rows in sweep order.
    #[must_use]
    pub fn rows(&self) -> &[MagnetizationRow] {
        &self.rows
    }

    /// Field of every row.
    #[must_use]
    pub fn magnetic_field(&self) -> Vec<Scalar> {
        self.rows.iter().map(|r| r.magnetic_field).collect()
    }

    /// Magnetization left after the fits run so far.
    #[must_use]
    pub fn residual(&self) -> &[Scalar] {
        &self.residual
    }

    /// Fitted linear background at every row, after [`diamagnetism`](Self::diamagnetism).
    #[must_use]
    pub fn diamagnetic_fit(&self) -> Option<&[Scalar]> {
        self.diamagnetism.as_deref()
    }

    /// Fitted loop at every row, once [`ferromagnetism`](Self::ferromagnetism) ran.
    #[must_use]
    pub fn ferromagnetic_fit(&self) -> Option<&[Scalar]> {
        self.ferromagnetism.as_deref()
    }

    /// Restores the residual to the measured magnetization and drops stored fits.
    pub fn reset_residual(&mut self) {
        self.residual = self.rows.iter().map(|r| r.magnetization).collect();
        self.diamagnetism = None;
        self.ferromagnetism = None;
    }

    fn values(&self, source: MagnetizationSource) -> Vec<Scalar> {
        match source {
            MagnetizationSource::Measured => self.rows.iter().map(|r| r.magnetization).collect(),
            MagnetizationSource::Residual => self.residual.clone(),
        }
    }

    /// Fits the linear background with [`lateral_linear_fit`].
    ///
    /// On success the residual becomes `source - fit`.
    pub fn diamagnetism(
        &mut self,
        source: MagnetizationSource,
        percentage: Scalar,
    ) -> Result<LinearBackground, MagnetizationError> {
        let field = self.magnetic_field();
        let magnetization = self.values(source);
        let fit = lateral_linear_fit(&field, &magnetization, percentage)?;
        let background = LinearBackground {
            magnetic_susceptibility: fit.slope,
            offset: fit.intercept,
        };
        debug!(
            susceptibility = background.magnetic_susceptibility,
            offset = background.offset,
            "linear background"
        );

        let simulated: Vec<Scalar> = field.iter().map(|&b| background.eval(b)).collect();
        self.residual = magnetization
            .iter()
            .zip(&simulated)
            .map(|(m, s)| m - s)
            .collect();
        self.diamagnetism = Some(simulated);
        Ok(background)
    }

    /// Starting loop for [`ferromagnetism`](Self::ferromagnetism): half the
    /// magnetization span as saturation, half of that as remanence, and a tenth of the
    /// field span as coercivity.
    #[must_use]
    pub fn ferromagnetism_initial_guess(&self, source: MagnetizationSource) -> HysteresisLoop {
        let span = |values: &[Scalar]| {
            let max = values.iter().copied().fold(Scalar::NEG_INFINITY, Scalar::max);
            let min = values.iter().copied().fold(Scalar::INFINITY, Scalar::min);
            (max - min).abs()
        };
        let saturation = span(&self.values(source)) / 2.0;
        HysteresisLoop::new(saturation, saturation / 2.0, span(&self.magnetic_field()) / 10.0)
    }

    /// Fits a [`HysteresisLoop`] by nonlinear least squares, starting from `initial` or
    /// from [`ferromagnetism_initial_guess`](Self::ferromagnetism_initial_guess).
    ///
    /// On success the residual becomes `source - fit`.
    pub fn ferromagnetism(
        &mut self,
        source: MagnetizationSource,
        initial: Option<HysteresisLoop>,
        config: &CurveFitConfig,
    ) -> Result<HysteresisLoop, MagnetizationError> {
        if self.rows.len() < 3 {
            return Err(MagnetizationError::InsufficientData {
                rows: self.rows.len(),
            });
        }
        let initial = initial.unwrap_or_else(|| self.ferromagnetism_initial_guess(source));
        if !initial.is_physical() {
            return Err(MagnetizationError::InvalidInitialGuess(initial));
        }

        let field = self.magnetic_field();
        let magnetization = self.values(source);
        let model = |p: &[Scalar; 3]| HysteresisLoop::new(p[0], p[1], p[2]).sweep(&field);
        let start = [initial.saturation, initial.remanence, initial.coercivity];
        let fit = curve_fit(model, &magnetization, start, config)
            .ok_or(MagnetizationError::InvalidInitialGuess(initial))?;
        if !fit.converged {
            return Err(MagnetizationError::Convergence {
                iterations: fit.iterations,
                residual: fit.residual,
            });
        }

        let [saturation, remanence, coercivity] = fit.parameters;
        let hysteresis = HysteresisLoop::new(saturation, remanence, coercivity);
        debug!(
            saturation,
            remanence,
            coercivity,
            iterations = fit.iterations,
            residual = fit.residual,
            "hysteresis loop"
        );

        let simulated = hysteresis.sweep(&field);
        self.residual = magnetization
            .iter()
            .zip(&simulated)
            .map(|(m, s)| m - s)
            .collect();
        self.ferromagnetism = Some(simulated);
        Ok(hysteresis)
    }

    /// `|background / loop|` at the last row, once both fits ran.
    #[must_use]
    pub fn ratio_dm_fm(&self) -> Option<Scalar> {
        let dm = self.diamagnetism.as_deref()?.last()?;
        let fm = self.ferromagnetism.as_deref()?.last()?;
        Some((dm / fm).abs())
    }
}

/// Options of the magnetization analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnetizationOptions {
    /// Share of the field range fitted at each end for the linear background.
    pub lateral_percentage: Scalar,
    /// Stopping rules of the hysteresis fit.
    pub fit: CurveFitConfig,
}

impl Default for MagnetizationOptions {
    fn default() -> Self {
        Self {
            lateral_percentage: DEFAULT_LATERAL_PERCENTAGE,
            fit: CurveFitConfig::default(),
        }
    }
}

/// Analyses a sweep with the default options.
pub fn process(
    measurement: &MagnetizationMeasurement,
) -> Result<MagnetizationResults, MagnetizationError> {
    process_with(measurement, &MagnetizationOptions::default())
}

/// Fits the linear background, then the hysteresis loop on what it leaves.
///
/// Works on a copy; the caller's measurement keeps its residual.
pub fn process_with(
    measurement: &MagnetizationMeasurement,
    options: &MagnetizationOptions,
) -> Result<MagnetizationResults, MagnetizationError> {
    let mut work = measurement.clone();
    work.reset_residual();
    let background =
        work.diamagnetism(MagnetizationSource::Residual, options.lateral_percentage)?;
    let hysteresis = work.ferromagnetism(MagnetizationSource::Residual, None, &options.fit)?;
    let ratio_dm_fm = work
        .ratio_dm_fm()
        .ok_or(MagnetizationError::InsufficientData {
            rows: work.rows.len(),
        })?;

    Ok(MagnetizationResults {
        magnetic_susceptibility: background.magnetic_susceptibility,
        offset: background.offset,
        saturation: hysteresis.saturation,
        remanence: hysteresis.remanence,
        coercivity: hysteresis.coercivity,
        ratio_dm_fm,
    })
}

/// Magnetization experiment for batch processing with [`crate::experiment::process_all`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Magnetization {
    /// Options applied to every sample.
    pub options: MagnetizationOptions,
}

impl Experiment for Magnetization {
    type Input = MagnetizationMeasurement;
    type Output = MagnetizationResults;
    type Error = MagnetizationError;

    fn process(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        process_with(input, &self.options)
    }
}
