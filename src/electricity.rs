//! Electrical quantity conversions in SI units.
//!
//! These are plain IEEE-754 formulas; input validation belongs to the caller.

use crate::constants::ELEMENTARY_CHARGE;
use crate::math::Scalar;

/// Resistance in ohms from a voltage (V) and a current (A).
#[inline]
#[must_use]
pub fn resistance_from_ohms_law(voltage: Scalar, current: Scalar) -> Scalar {
    voltage / current
}

/// Resistivity in ohm-metres from sheet resistance (Ω/□) and layer thickness (m).
#[inline]
#[must_use]
pub fn resistivity_from_sheet_resistance(sheet_resistance: Scalar, thickness: Scalar) -> Scalar {
    sheet_resistance * thickness
}

/// Resistivity in ohm-metres of a uniform bar of given cross-section (m²) and length (m).
#[inline]
#[must_use]
pub fn resistivity_from_resistance(
    resistance: Scalar,
    cross_sectional_area: Scalar,
    length: Scalar,
) -> Scalar {
    resistance * cross_sectional_area / length
}

/// Conductance in siemens.
#[inline]
#[must_use]
pub fn conductance(resistance: Scalar) -> Scalar {
    1.0 / resistance
}

/// Sheet conductance in siemens per square.
#[inline]
#[must_use]
pub fn sheet_conductance(sheet_resistance: Scalar) -> Scalar {
    1.0 / sheet_resistance
}

/// Conductivity in siemens per metre.
#[inline]
#[must_use]
pub fn conductivity(resistivity: Scalar) -> Scalar {
    1.0 / resistivity
}

/// Volumetric carrier concentration (m⁻³) from sheet density (m⁻²) and thickness (m).
#[inline]
#[must_use]
pub fn carrier_concentration(sheet_density: Scalar, thickness: Scalar) -> Scalar {
    sheet_density / thickness
}

/// Carrier mobility (m²/(V·s)) from sheet density (m⁻²) and sheet resistance (Ω/□).
///
/// `μ = 1 / (e · n_s · R_s)`.
#[inline]
#[must_use]
pub fn mobility_from_sheets(sheet_density: Scalar, sheet_resistance: Scalar) -> Scalar {
    1.0 / (ELEMENTARY_CHARGE * sheet_density * sheet_resistance)
}
