//! Shared numerical primitives anchored on `nalgebra`.

use nalgebra::{DMatrix, DVector};

/// Primary scalar type used across the crate.
pub type Scalar = f64;

/// Permutation parity sign of `digits` relative to their ascending ordering.
///
/// Counts the inversions, i.e. index pairs `i < j` with `digits[i] > digits[j]`:
/// `sgn(σ) = (-1)^inversions`. Returns `+1` for even and `-1` for odd permutations.
/// Usable in constant context, e.g. over the ASCII bytes of a digit label.
#[must_use]
pub const fn permutation_sign(digits: &[u8]) -> i8 {
    let mut inversions = 0usize;
    let mut i = 0;
    while i < digits.len() {
        let mut j = i + 1;
        while j < digits.len() {
            if digits[i] > digits[j] {
                inversions += 1;
            }
            j += 1;
        }
        i += 1;
    }
    if inversions % 2 == 0 {
        1
    } else {
        -1
    }
}

/// Arithmetic mean, or `None` for an empty input.
#[must_use]
pub fn mean(values: impl IntoIterator<Item = Scalar>) -> Option<Scalar> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as Scalar)
}

/// Least-squares straight line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Value at `x = 0`.
    pub intercept: Scalar,
    /// Gradient `dy/dx`.
    pub slope: Scalar,
    /// Sum of squared residuals.
    pub residual: Scalar,
}

impl LinearFit {
    /// Evaluates the fitted line at `x`.
    #[must_use]
    pub fn eval(&self, x: Scalar) -> Scalar {
        self.intercept + self.slope * x
    }
}

/// Fits a first-degree polynomial to `(x, y)` through the SVD of the Vandermonde matrix.
///
/// Returns `None` when fewer than two points are given, when the slices differ in
/// length, or when all `x` coincide.
#[must_use]
pub fn linear_fit(x: &[Scalar], y: &[Scalar]) -> Option<LinearFit> {
    let n = x.len();
    if n < 2 || y.len() != n {
        return None;
    }
    let first = x[0];
    if x.iter().all(|&xi| xi == first) {
        return None;
    }

    let design = DMatrix::from_fn(n, 2, |row, col| if col == 0 { 1.0 } else { x[row] });
    let rhs = DVector::from_column_slice(y);
    let coefficients = design.clone().svd(true, true).solve(&rhs, Scalar::EPSILON).ok()?;

    let residual = (&design * &coefficients - &rhs).norm_squared();
    Some(LinearFit {
        intercept: coefficients[0],
        slope: coefficients[1],
        residual,
    })
}

/// Stopping rules of [`curve_fit`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveFitConfig {
    /// Maximum number of damped Gauss-Newton steps, accepted or rejected.
    pub max_iterations: usize,
    /// Stop once the cost decrease or the step length falls below this fraction.
    pub relative_tolerance: Scalar,
    /// Starting Levenberg-Marquardt damping factor.
    pub initial_damping: Scalar,
}

impl Default for CurveFitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            relative_tolerance: 1.0e-12,
            initial_damping: 1.0e-3,
        }
    }
}

impl CurveFitConfig {
    /// Overrides the iteration budget.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Outcome of a nonlinear least-squares fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveFit<const N: usize> {
    /// Best parameters found.
    pub parameters: [Scalar; N],
    /// Sum of squared residuals at `parameters`.
    pub residual: Scalar,
    /// Number of steps taken.
    pub iterations: usize,
    /// False when the iteration budget ran out first.
    pub converged: bool,
}

const MIN_DAMPING: Scalar = 1.0e-15;
const MAX_DAMPING: Scalar = 1.0e16;

/// Fits `model(parameters) ≈ y` by Levenberg-Marquardt with a forward-difference
/// Jacobian and Marquardt's diagonal scaling.
///
/// `model` maps a parameter set to one prediction per observation. Returns `None`
/// when the model yields the wrong number of points or a non-finite cost at `initial`.
#[must_use]
pub fn curve_fit<const N: usize, F>(
    model: F,
    y: &[Scalar],
    initial: [Scalar; N],
    config: &CurveFitConfig,
) -> Option<CurveFit<N>>
where
    F: Fn(&[Scalar; N]) -> Vec<Scalar>,
{
    let n = y.len();
    let target = DVector::from_column_slice(y);
    let predict = |p: &DVector<Scalar>| {
        let values = model(&std::array::from_fn(|i| p[i]));
        (values.len() == n).then(|| DVector::from_vec(values))
    };
    let finish = |p: &DVector<Scalar>, residual: Scalar, iterations: usize, converged: bool| {
        CurveFit {
            parameters: std::array::from_fn(|i| p[i]),
            residual,
            iterations,
            converged,
        }
    };

    let mut parameters = DVector::from_column_slice(&initial);
    let mut prediction = predict(&parameters)?;
    let mut residual = &target - &prediction;
    let mut cost = residual.norm_squared();
    if !cost.is_finite() {
        return None;
    }
    let mut damping = config.initial_damping;

    for iteration in 1..=config.max_iterations {
        if cost == 0.0 {
            return Some(finish(&parameters, cost, iteration - 1, true));
        }

        let mut jacobian = DMatrix::<Scalar>::zeros(n, N);
        for j in 0..N {
            let scale = if parameters[j] == 0.0 { 1.0 } else { parameters[j].abs() };
            let h = Scalar::EPSILON.sqrt() * scale;
            // Fall back to a backward difference at the edge of the model's domain.
            let column = [h, -h].into_iter().find_map(|h| {
                let mut shifted = parameters.clone();
                shifted[j] += h;
                let column = (predict(&shifted)? - &prediction) / h;
                column.iter().all(|v| v.is_finite()).then_some(column)
            });
            let Some(column) = column else {
                return Some(finish(&parameters, cost, iteration - 1, false));
            };
            jacobian.set_column(j, &column);
        }

        let normal = jacobian.tr_mul(&jacobian);
        let gradient = jacobian.tr_mul(&residual);
        let mut damped = normal.clone();
        for i in 0..N {
            let diagonal = if normal[(i, i)] > 0.0 { normal[(i, i)] } else { 1.0 };
            damped[(i, i)] += damping * diagonal;
        }
        let step = damped
            .lu()
            .solve(&gradient)
            .filter(|step| step.iter().all(|v| v.is_finite()));

        let candidate = step.as_ref().map(|step| &parameters + step);
        let trial = candidate.as_ref().and_then(|c| {
            let prediction = predict(c)?;
            let residual = &target - &prediction;
            let cost = residual.norm_squared();
            cost.is_finite().then_some((prediction, residual, cost))
        });

        match (step, candidate, trial) {
            (Some(step), Some(candidate), Some((trial, trial_residual, trial_cost)))
                if trial_cost < cost =>
            {
                let decrease = cost - trial_cost;
                parameters = candidate;
                prediction = trial;
                residual = trial_residual;
                cost = trial_cost;
                damping = (damping / 10.0).max(MIN_DAMPING);

                let tol = config.relative_tolerance;
                if decrease <= tol * cost || step.norm() <= tol * (parameters.norm() + tol) {
                    return Some(finish(&parameters, cost, iteration, true));
                }
            }
            _ => {
                damping *= 10.0;
                if damping > MAX_DAMPING {
                    // No downhill step remains: a local minimum.
                    return Some(finish(&parameters, cost, iteration, true));
                }
            }
        }
    }

    Some(finish(&parameters, cost, config.max_iterations, false))
}
