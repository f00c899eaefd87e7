//! Sheet resistance from the Van der Pauw implicit relation.
//!
//! For a thin sample with contacts on its perimeter the horizontal and vertical
//! four-point resistances satisfy
//!
//! ```text
//! exp(-π R_v / R_s) + exp(-π R_h / R_s) = 1
//! ```
//!
//! The left side is monotonic in `R_s`, so there is exactly one positive root. It is
//! found with a secant iteration seeded by the closed form for a symmetric sample.
//!
//! # References
//!
//! - van der Pauw, L. J. (1958). Philips Research Reports 13, 1-9.

use std::f64::consts::PI;

use tracing::{debug, trace};

use super::geometry::Axis;
use super::VanDerPauwError;
use crate::constants::van_der_pauw_constant;
use crate::math::Scalar;

/// Iteration budget and tolerances of the secant root finder.
///
/// A step is accepted once it is within `absolute_tolerance + relative_tolerance·|R_s|`
/// and the implicit formula is within `residual_tolerance` of zero. The default
/// absolute tolerance is zero, so convergence does not depend on the resistance unit.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Maximum number of secant steps.
    pub max_iterations: usize,
    /// Absolute step tolerance in ohms.
    pub absolute_tolerance: Scalar,
    /// Step tolerance relative to the current estimate.
    pub relative_tolerance: Scalar,
    /// Largest accepted `|implicit_formula|` at the root (dimensionless).
    pub residual_tolerance: Scalar,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            absolute_tolerance: 0.0,
            relative_tolerance: 1.0e-12,
            residual_tolerance: 1.0e-9,
        }
    }
}

impl SolverConfig {
    /// Overrides the iteration budget.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Overrides both step tolerances.
    #[must_use]
    pub const fn with_tolerances(mut self, absolute: Scalar, relative: Scalar) -> Self {
        self.absolute_tolerance = absolute;
        self.relative_tolerance = relative;
        self
    }

    /// Overrides the residual tolerance.
    #[must_use]
    pub const fn with_residual_tolerance(mut self, residual: Scalar) -> Self {
        self.residual_tolerance = residual;
        self
    }

    fn is_converged(&self, step: Scalar, estimate: Scalar, residual: Scalar) -> bool {
        step <= self.absolute_tolerance + self.relative_tolerance * estimate.abs()
            && residual.abs() <= self.residual_tolerance
    }
}

/// Outcome of a successful root search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    /// Sheet resistance in ohms per square.
    pub root: Scalar,
    /// Secant steps taken.
    pub iterations: usize,
    /// Value of [`implicit_formula`] at `root`.
    pub residual: Scalar,
}

/// Van der Pauw implicit function `exp(-π R_v/R_s) + exp(-π R_h/R_s) - 1`.
///
/// The correct sheet resistance `rs` is the root of this function. `rs` must be
/// strictly positive.
#[inline]
#[must_use]
pub fn implicit_formula(rs: Scalar, rh: Scalar, rv: Scalar) -> Scalar {
    (-PI * rv / rs).exp() + (-PI * rh / rs).exp() - 1.0
}

/// Sheet resistance of a symmetric sample, `(R_h + R_v)/2 · π/ln 2`.
///
/// Exact only when `rh == rv`; used to seed [`universal_solve`].
#[inline]
#[must_use]
pub fn square_approximation(rh: Scalar, rv: Scalar) -> Scalar {
    (rh + rv) / 2.0 * van_der_pauw_constant()
}

/// Finds the root of [`implicit_formula`] near `rs0` with the default [`SolverConfig`].
pub fn universal_solve(
    rh: Scalar,
    rv: Scalar,
    rs0: Scalar,
) -> Result<SolveReport, VanDerPauwError> {
    universal_solve_with(rh, rv, rs0, &SolverConfig::default())
}

/// Finds the root of [`implicit_formula`] near `rs0` by secant iteration.
///
/// The second starting point is `rs0 · (1 + 1e-4)`, so the iteration behaves the same
/// at any resistance scale. Iterates that leave the positive half-line are replaced by
/// half of the previous estimate. A small step with a large residual keeps iterating
/// and ends in [`VanDerPauwError::Convergence`] once the budget is spent.
pub fn universal_solve_with(
    rh: Scalar,
    rv: Scalar,
    rs0: Scalar,
    config: &SolverConfig,
) -> Result<SolveReport, VanDerPauwError> {
    if !(rs0.is_finite() && rs0 > 0.0) {
        return Err(VanDerPauwError::InvalidSeed(rs0));
    }
    let f = |rs: Scalar| implicit_formula(rs, rh, rv);

    let mut p0 = rs0;
    let mut q0 = f(p0);
    let mut p1 = rs0 * (1.0 + 1.0e-4);
    let mut q1 = f(p1);
    if q1.abs() < q0.abs() {
        std::mem::swap(&mut p0, &mut p1);
        std::mem::swap(&mut q0, &mut q1);
    }

    for iteration in 1..=config.max_iterations {
        if q1 == 0.0 {
            return Ok(converged(p1, iteration - 1, q1));
        }
        if q1 == q0 {
            // Flat secant: no further progress is possible from these two points.
            return Err(VanDerPauwError::Convergence {
                iterations: iteration - 1,
                last_estimate: p1,
                residual: q1,
            });
        }

        let mut p = p1 - q1 * (p1 - p0) / (q1 - q0);
        if !(p.is_finite() && p > 0.0) {
            p = 0.5 * p1;
        }
        let step = (p - p1).abs();
        trace!(iteration, estimate = p, step, "secant step");

        p0 = p1;
        q0 = q1;
        p1 = p;
        q1 = f(p1);

        if config.is_converged(step, p1, q1) {
            return Ok(converged(p1, iteration, q1));
        }
    }

    Err(VanDerPauwError::Convergence {
        iterations: config.max_iterations,
        last_estimate: p1,
        residual: q1,
    })
}

fn converged(root: Scalar, iterations: usize, residual: Scalar) -> SolveReport {
    debug!(root, iterations, residual, "sheet resistance converged");
    SolveReport {
        root,
        iterations,
        residual,
    }
}

/// Solves for `(sheet_resistance, ratio_resistance)` with the default [`SolverConfig`].
pub fn analyze(rh: Scalar, rv: Scalar) -> Result<(Scalar, Scalar), VanDerPauwError> {
    analyze_with(rh, rv, &SolverConfig::default())
}

/// Solves for `(sheet_resistance, ratio_resistance)`.
///
/// `ratio_resistance = max(R_h, R_v) / min(R_h, R_v)` is at least one; values far
/// above one point at misplaced contacts or a non-square sample.
pub fn analyze_with(
    rh: Scalar,
    rv: Scalar,
    config: &SolverConfig,
) -> Result<(Scalar, Scalar), VanDerPauwError> {
    for (axis, value) in [(Axis::Horizontal, rh), (Axis::Vertical, rv)] {
        if !(value.is_finite() && value > 0.0) {
            return Err(VanDerPauwError::NonPositiveResistance { axis, value });
        }
    }

    let rs0 = square_approximation(rh, rv);
    let report = universal_solve_with(rh, rv, rs0, config)?;
    let ratio = rh.max(rv) / rh.min(rv);
    Ok((report.root, ratio))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const PAIRS: [(Scalar, Scalar); 7] = [
        (1000.0, 1000.0),
        (1000.0, 100.0),
        (100.0, 1000.0),
        (1.0, 2.0),
        (3.3e-3, 1.7e-3),
        (5.0e6, 4.0e6),
        (1.0, 50.0),
    ];

    #[test]
    fn square_approximation_is_exact_for_symmetric_sample() {
        for rh in [1.0e-3, 1.0, 1000.0, 7.5e8] {
            assert_eq!(square_approximation(rh, rh), rh * van_der_pauw_constant());
        }
    }

    #[test]
    fn symmetric_sample_reference_value() {
        let (rs, ratio) = analyze(1000.0, 1000.0).expect("converges");
        assert_relative_eq!(rs, 4532.360_141_827_194, max_relative = 1.0e-9);
        assert_eq!(ratio, 1.0);
    }

    #[test]
    fn solution_is_a_root_of_the_implicit_formula() {
        for (rh, rv) in PAIRS {
            let (rs, _) = analyze(rh, rv).expect("converges");
            assert!(rs > 0.0);
            assert!(
                implicit_formula(rs, rh, rv).abs() < 1.0e-9,
                "rh={rh} rv={rv} rs={rs}"
            );
        }
    }

    #[test]
    fn ratio_is_symmetric_and_at_least_one() {
        for (rh, rv) in PAIRS {
            let (_, forward) = analyze(rh, rv).expect("converges");
            let (_, backward) = analyze(rv, rh).expect("converges");
            assert!(forward >= 1.0);
            assert_relative_eq!(forward, backward);
        }
        let (_, ratio) = analyze(1000.0, 100.0).expect("converges");
        assert_relative_eq!(ratio, 10.0);
    }

    #[test]
    fn asymmetric_sample_lies_below_the_square_estimate() {
        let (rs, _) = analyze(1000.0, 100.0).expect("converges");
        assert!(rs < square_approximation(1000.0, 100.0));
        assert!(rs > 0.0);
    }

    #[test]
    fn solver_reports_iterations() {
        let report = universal_solve(1000.0, 100.0, square_approximation(1000.0, 100.0))
            .expect("converges");
        assert!(report.iterations >= 1);
        assert!(report.iterations <= SolverConfig::default().max_iterations);
        assert_relative_eq!(report.residual, implicit_formula(report.root, 1000.0, 100.0));
    }

    #[test]
    fn exhausted_budget_is_a_convergence_error() {
        let config = SolverConfig::default().with_max_iterations(1);
        let err = analyze_with(1000.0, 100.0, &config).expect_err("one step is not enough");
        match err {
            VanDerPauwError::Convergence { iterations, .. } => assert_eq!(iterations, 1),
            other => panic!("unexpected error {other:?}"),
        }

        let zero = SolverConfig::default().with_max_iterations(0);
        assert!(matches!(
            analyze_with(1000.0, 1000.0, &zero),
            Err(VanDerPauwError::Convergence { iterations: 0, .. })
        ));
    }

    #[test]
    fn non_positive_resistances_are_rejected() {
        assert!(matches!(
            analyze(0.0, 10.0),
            Err(VanDerPauwError::NonPositiveResistance { axis: Axis::Horizontal, .. })
        ));
        assert!(matches!(
            analyze(10.0, -1.0),
            Err(VanDerPauwError::NonPositiveResistance { axis: Axis::Vertical, .. })
        ));
        assert!(matches!(
            analyze(Scalar::NAN, 10.0),
            Err(VanDerPauwError::NonPositiveResistance { .. })
        ));
    }

    #[test]
    fn invalid_seed_is_rejected() {
        assert!(matches!(
            universal_solve(1.0, 1.0, 0.0),
            Err(VanDerPauwError::InvalidSeed(_))
        ));
        assert!(matches!(
            universal_solve(1.0, 1.0, Scalar::INFINITY),
            Err(VanDerPauwError::InvalidSeed(_))
        ));
    }

    #[test]
    fn distant_seed_still_converges() {
        let report = universal_solve(1000.0, 100.0, 100.0).expect("converges from far below");
        let (rs, _) = analyze(1000.0, 100.0).expect("converges");
        assert_relative_eq!(report.root, rs, max_relative = 1.0e-9);
    }

    #[test]
    fn small_resistances_converge_to_the_true_root() {
        let (unit, _) = analyze(1.0, 2.0).expect("converges");
        let (rs, _) = analyze(1.0e-9, 2.0e-9).expect("converges at the nano-ohm scale");
        assert_relative_eq!(rs, 1.0e-9 * unit, max_relative = 1.0e-9);

        for (rh, rv) in [(1.0e-9, 2.0e-9), (1.0e-8, 3.0e-8), (2.0e-12, 5.0e-13)] {
            let report = universal_solve(rh, rv, square_approximation(rh, rv)).expect("converges");
            assert!(report.residual.abs() < 1.0e-9, "rh={rh} rv={rv} {report:?}");
            assert!(implicit_formula(report.root, rh, rv).abs() < 1.0e-9);
        }
    }

    #[test]
    fn small_step_with_large_residual_keeps_iterating() {
        // A loose absolute tolerance no longer accepts a far-off estimate.
        let config = SolverConfig::default().with_tolerances(1.0, 0.0);
        let report = universal_solve_with(1.0e-9, 2.0e-9, 1.0e-8, &config).expect("converges");
        assert!(report.residual.abs() <= config.residual_tolerance);

        let strict = SolverConfig::default()
            .with_max_iterations(1)
            .with_tolerances(1.0, 0.0);
        assert!(matches!(
            universal_solve_with(1.0e-9, 2.0e-9, 1.0e-8, &strict),
            Err(VanDerPauwError::Convergence { iterations: 1, .. })
        ));
    }

    #[test]
    fn flat_secant_is_a_convergence_error() {
        // Both starting points sit where the formula has saturated at -1.
        assert!(matches!(
            universal_solve(1000.0, 100.0, 1.0),
            Err(VanDerPauwError::Convergence { iterations: 0, .. })
        ));
    }
}
