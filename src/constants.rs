//! Physical and method constants.
//!
//! ## References
//!
//! - NIST Reference on Constants, Units, and Uncertainty: <https://physics.nist.gov/cuu/Constants/>
//! - van der Pauw, L. J. (1958). "A method of measuring specific resistivity and Hall
//!   effect of discs of arbitrary shape". Philips Research Reports 13, 1-9.

use std::f64::consts::{LN_2, PI};

use crate::math::Scalar;

/// Elementary charge _e_ in coulombs (C).
/// Exact value by 2019 SI definition: 1.602176634 × 10⁻¹⁹ C.
pub const ELEMENTARY_CHARGE: Scalar = 1.602_176_634e-19;

/// Returns the Van der Pauw geometric factor π / ln 2 ≈ 4.532.
///
/// Multiplying a four-point resistance of a symmetric sample by this factor gives
/// its sheet resistance.
#[inline]
#[must_use]
pub fn van_der_pauw_constant() -> Scalar {
    PI / LN_2
}
