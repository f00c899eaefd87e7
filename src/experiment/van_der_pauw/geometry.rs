//! Contact configurations of a four-point Van der Pauw measurement.
//!
//! Legend: `R_ij,kl = V_kl / I_ij`. Contacts are numbered 1 to 4 counterclockwise,
//! starting at the top-left contact. See
//! <https://en.wikipedia.org/wiki/Van_der_Pauw_method#Reversed_polarity_measurements>.

use std::fmt;
use std::str::FromStr;

use crate::math::permutation_sign;

/// Returned when a label names none of the known contact configurations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid geometry {label:?}: expected a permutation of 1234, horizontal or vertical")]
pub struct ParseGeometryError {
    /// The rejected label, as given.
    pub label: String,
}

/// Physical measurement axis a configuration measures.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal contact pair (odd permutations).
    Horizontal,
    /// Vertical contact pair (even permutations).
    Vertical,
}

impl Axis {
    /// The group-label geometry of this axis.
    #[must_use]
    pub const fn geometry(self) -> Geometry {
        match self {
            Self::Horizontal => Geometry::Horizontal,
            Self::Vertical => Geometry::Vertical,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => f.write_str("horizontal"),
            Self::Vertical => f.write_str("vertical"),
        }
    }
}

/// Resistance measurement configuration.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Geometry {
    /// `R_12,34`.
    R1234,
    /// `R_34,12`.
    R3412,
    /// `R_21,43`.
    R2143,
    /// `R_43,21`.
    R4321,
    /// `R_23,41`.
    R2341,
    /// `R_41,23`.
    R4123,
    /// `R_32,14`.
    R3214,
    /// `R_14,32`.
    R1432,
    /// Vertical group label, value `"12"`.
    Vertical,
    /// Horizontal group label, value `"21"`.
    Horizontal,
}

const fn sign_table() -> [i8; 10] {
    let mut table = [0; 10];
    let mut k = 0;
    while k < Geometry::ALL.len() {
        table[k] = permutation_sign(Geometry::ALL[k].value().as_bytes());
        k += 1;
    }
    table
}

/// Permutation sign of every variant, indexed like [`Geometry::ALL`].
const SIGNS: [i8; 10] = sign_table();

impl Geometry {
    /// Every configuration, group labels last.
    pub const ALL: [Self; 10] = [
        Self::R1234,
        Self::R3412,
        Self::R2143,
        Self::R4321,
        Self::R2341,
        Self::R4123,
        Self::R3214,
        Self::R1432,
        Self::Vertical,
        Self::Horizontal,
    ];

    /// The eight four-contact configurations.
    pub const PERMUTATIONS: [Self; 8] = [
        Self::R1234,
        Self::R3412,
        Self::R2143,
        Self::R4321,
        Self::R2341,
        Self::R4123,
        Self::R3214,
        Self::R1432,
    ];

    /// Parses a digit permutation (`"2143"`), a group value (`"12"`, `"21"`) or the
    /// words `"horizontal"` / `"vertical"` in any ASCII case.
    pub fn parse(text: &str) -> Result<Self, ParseGeometryError> {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("horizontal") {
            return Ok(Self::Horizontal);
        }
        if trimmed.eq_ignore_ascii_case("vertical") {
            return Ok(Self::Vertical);
        }
        Self::ALL
            .into_iter()
            .find(|g| g.value() == trimmed)
            .ok_or_else(|| ParseGeometryError {
                label: text.to_owned(),
            })
    }

    /// Contact digits of the configuration.
    #[must_use]
    pub const fn value(self) -> &'static str {
        match self {
            Self::R1234 => "1234",
            Self::R3412 => "3412",
            Self::R2143 => "2143",
            Self::R4321 => "4321",
            Self::R2341 => "2341",
            Self::R4123 => "4123",
            Self::R3214 => "3214",
            Self::R1432 => "1432",
            Self::Vertical => "12",
            Self::Horizontal => "21",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::R1234 => 0,
            Self::R3412 => 1,
            Self::R2143 => 2,
            Self::R4321 => 3,
            Self::R2341 => 4,
            Self::R4123 => 5,
            Self::R3214 => 6,
            Self::R1432 => 7,
            Self::Vertical => 8,
            Self::Horizontal => 9,
        }
    }

    /// True for the two group labels.
    #[must_use]
    pub const fn is_group(self) -> bool {
        matches!(self, Self::Vertical | Self::Horizontal)
    }

    /// Permutation parity sign of the contact digits, `+1` or `-1`.
    #[must_use]
    pub const fn permutation_sign(self) -> i8 {
        SIGNS[self.index()]
    }

    /// True if the configuration measures the horizontal axis.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        self.permutation_sign() == -1
    }

    /// True if the configuration measures the vertical axis.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        self.permutation_sign() == 1
    }

    /// Axis measured by the configuration.
    #[must_use]
    pub const fn axis(self) -> Axis {
        if self.is_horizontal() {
            Axis::Horizontal
        } else {
            Axis::Vertical
        }
    }

    /// Reduces the configuration to its group label.
    #[must_use]
    pub const fn classify(self) -> Self {
        self.axis().geometry()
    }

    /// Swaps current and voltage polarity: the two contacts of each terminal pair
    /// exchange places (`1234` → `2143`). Group labels are returned unchanged.
    #[must_use]
    pub fn reverse_polarity(self) -> Self {
        if self.is_group() {
            return self;
        }
        let d = self.value().as_bytes();
        self.with_digits([d[1], d[0], d[3], d[2]])
    }

    /// Cyclically shifts the contact digits by `number` positions, to the left when
    /// `counterclockwise` and to the right otherwise (`1234` → `2341` counterclockwise).
    ///
    /// `number` is taken modulo the digit count, so any integer is accepted. Every
    /// odd shift moves the configuration to the other axis.
    #[must_use]
    pub fn rotate(self, number: i64, counterclockwise: bool) -> Self {
        let mut digits = self.value().as_bytes().to_vec();
        let shift = number.rem_euclid(digits.len() as i64) as usize;
        if counterclockwise {
            digits.rotate_left(shift);
        } else {
            digits.rotate_right(shift);
        }
        Self::ALL
            .into_iter()
            .find(|g| g.value().as_bytes() == digits.as_slice())
            .unwrap_or(self)
    }

    fn with_digits(self, digits: [u8; 4]) -> Self {
        Self::PERMUTATIONS
            .into_iter()
            .find(|g| g.value().as_bytes() == digits)
            .unwrap_or(self)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertical => f.write_str("vertical"),
            Self::Horizontal => f.write_str("horizontal"),
            other => f.write_str(other.value()),
        }
    }
}

impl FromStr for Geometry {
    type Err = ParseGeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Geometry {
    type Error = ParseGeometryError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Axis> for Geometry {
    fn from(axis: Axis) -> Self {
        axis.geometry()
    }
}
