//! Model curves fitted by the experiment analyses.

use crate::math::Scalar;

/// Tanh model of a ferromagnetic hysteresis loop.
///
/// Each branch is `M = M_s tanh(k (H ± H_c))` with `k = artanh(M_r / M_s) / H_c`. The
/// descending branch, coming from positive saturation, passes through `+M_r` at zero
/// field and through zero at `-H_c`; the ascending branch mirrors it.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HysteresisLoop {
    /// Saturation magnetization `M_s`.
    pub saturation: Scalar,
    /// Remanent magnetization `M_r` at zero field.
    pub remanence: Scalar,
    /// Coercive field `H_c`, in the unit of the field axis.
    pub coercivity: Scalar,
}

impl HysteresisLoop {
    /// Creates the loop.
    #[must_use]
    pub const fn new(saturation: Scalar, remanence: Scalar, coercivity: Scalar) -> Self {
        Self {
            saturation,
            remanence,
            coercivity,
        }
    }

    /// True when `|M_r| < |M_s|` and `H_c` is finite and non-zero.
    #[must_use]
    pub fn is_physical(&self) -> bool {
        self.remanence.abs() < self.saturation.abs()
            && self.coercivity.is_finite()
            && self.coercivity != 0.0
    }

    fn steepness(&self) -> Scalar {
        if self.is_physical() {
            (self.remanence / self.saturation).atanh() / self.coercivity
        } else {
            Scalar::NAN
        }
    }

    /// Magnetization at `field` on the descending or ascending branch.
    ///
    /// `NaN` for a loop that is not [physical](Self::is_physical).
    #[must_use]
    pub fn branch(&self, field: Scalar, descending: bool) -> Scalar {
        let shift = if descending {
            self.coercivity
        } else {
            -self.coercivity
        };
        self.saturation * (self.steepness() * (field + shift)).tanh()
    }

    /// Magnetization along a field sweep.
    ///
    /// A point is on the descending branch when the field fell since the previous point.
    /// The first point takes the direction towards the second, and a repeated field
    /// value keeps the current direction.
    #[must_use]
    pub fn sweep(&self, field: &[Scalar]) -> Vec<Scalar> {
        let mut descending = match field {
            [first, second, ..] => second < first,
            _ => true,
        };
        let mut previous = field.first().copied();
        field
            .iter()
            .map(|&h| {
                if let Some(p) = previous {
                    if h != p {
                        descending = h < p;
                    }
                }
                previous = Some(h);
                self.branch(h, descending)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const LOOP: HysteresisLoop = HysteresisLoop::new(2.0, 1.0, 100.0);

    #[test]
    fn branches_pass_through_remanence_and_coercivity() {
        assert_relative_eq!(LOOP.branch(0.0, true), 1.0, max_relative = 1.0e-12);
        assert_relative_eq!(LOOP.branch(0.0, false), -1.0, max_relative = 1.0e-12);
        assert_relative_eq!(LOOP.branch(-100.0, true), 0.0, epsilon = 1.0e-12);
        assert_relative_eq!(LOOP.branch(100.0, false), 0.0, epsilon = 1.0e-12);
        assert_relative_eq!(LOOP.branch(5000.0, false), 2.0, max_relative = 1.0e-12);
        assert_relative_eq!(LOOP.branch(-5000.0, true), -2.0, max_relative = 1.0e-12);
    }

    #[test]
    fn sweep_follows_field_direction() {
        let field = [200.0, 0.0, -200.0, -200.0, 0.0, 200.0];
        let m = LOOP.sweep(&field);
        assert_relative_eq!(m[1], 1.0, max_relative = 1.0e-12);
        assert_eq!(m[2], m[3]);
        assert_relative_eq!(m[4], -1.0, max_relative = 1.0e-12);
        assert_eq!(m[0], LOOP.branch(200.0, true));
        assert_eq!(m[5], LOOP.branch(200.0, false));
        assert_eq!(LOOP.sweep(&[0.0]), vec![LOOP.branch(0.0, true)]);
        assert!(LOOP.sweep(&[]).is_empty());
    }

    #[test]
    fn unphysical_loops_evaluate_to_nan() {
        assert!(!HysteresisLoop::new(1.0, 1.0, 100.0).is_physical());
        assert!(!HysteresisLoop::new(1.0, 0.5, 0.0).is_physical());
        assert!(HysteresisLoop::new(1.0, 2.0, 100.0).branch(0.0, true).is_nan());
    }
}
